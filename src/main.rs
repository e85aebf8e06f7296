//! bitlib - CLI to publish CNC tool-library records.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bitlib_rs::publish::{refresh_tool_table, DirTransport};
use bitlib_rs::{map_tool, JsonStore, PublishConfig, Publisher, SchemaVersion, ToolStore};

/// Publish tool-library records as FCTB files, wiki pages and tool tables.
#[derive(Parser, Debug)]
#[command(name = "bitlib")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input tool store JSON file
    #[arg(short, long)]
    input: PathBuf,

    /// Publish a single tool by number instead of the whole store
    #[arg(short, long)]
    tool: Option<u32>,

    /// Output directory for generated .fctb files
    #[arg(long, default_value = "Bit")]
    bits_dir: PathBuf,

    /// Output path for the library manifest
    #[arg(long, default_value = "Library/tools.json")]
    library: PathBuf,

    /// Output directory for rendered wiki pages
    #[arg(long, default_value = "wiki")]
    wiki_dir: PathBuf,

    /// Directory holding tool images to publish alongside the pages
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// Write tool-table update lines to this path
    #[arg(long)]
    tool_table: Option<PathBuf>,

    /// Merge the update lines into this master tool table in place
    #[arg(long, requires = "tool_table")]
    master: Option<PathBuf>,

    /// Spindle ceiling of the target machine
    #[arg(long, default_value = "24000")]
    machine_max_rpm: i64,

    /// Tool bit schema version: legacy, current or current+
    #[arg(long, default_value = "current")]
    schema_version: SchemaVersion,

    /// Dump mapped tool JSON instead of publishing
    #[arg(long)]
    debug: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Loading store: {}", args.input.display());

    let store = JsonStore::open(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    let config = PublishConfig {
        machine_max_rpm: args.machine_max_rpm,
        bits_dir: args.bits_dir.clone(),
        library_file: args.library.clone(),
        images_dir: args.images_dir.clone(),
        ..Default::default()
    };

    // Debug output
    if args.debug {
        let catalog = store.catalog()?;
        for record in store.tools(args.tool)? {
            let mapped = map_tool(&record, &catalog, args.schema_version, &config);
            for warning in &mapped.warnings {
                warn!("Tool {}: {}", record.tool_number, warning);
            }
            println!("{}", serde_json::to_string_pretty(&mapped.json)?);
        }
        return Ok(());
    }

    let mut transport = DirTransport::new(&args.wiki_dir);
    let publisher = Publisher::new(config.clone(), args.schema_version);
    let report = publisher.publish(&store, &mut transport, args.tool, |_| {})?;

    for warning in &report.warnings {
        warn!("{}", warning);
    }
    for failure in &report.failures {
        tracing::error!("Tool {}: {}", failure.tool_number, failure.message);
    }

    info!(
        "Published {} tool(s), {} failure(s)",
        report.published.len(),
        report.failures.len()
    );

    // Tool table output. Always generated from the full store: merging
    // a partial line set would drop the other tools from the master.
    if let Some(table_path) = &args.tool_table {
        refresh_tool_table(&store, &config, table_path, args.master.as_deref())
            .with_context(|| format!("Failed to refresh {}", table_path.display()))?;
    }

    if !report.is_success() {
        anyhow::bail!("{} tool(s) failed to publish", report.failures.len());
    }

    Ok(())
}
