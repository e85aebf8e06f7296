//! bitlib - Tool library publishing for CNC cutting tools.
//!
//! This library turns a store of cutting-tool records into the artifacts
//! a shop floor consumes: versioned `.fctb` tool definition files, wiki
//! pages with an index, and machine tool-table lines merged into a
//! master table.
//!
//! # Example
//!
//! ```no_run
//! use bitlib_rs::{JsonStore, Publisher, PublishConfig, SchemaVersion};
//! use bitlib_rs::publish::DirTransport;
//!
//! let store = JsonStore::open("tools.json").unwrap();
//! let mut transport = DirTransport::new("wiki-out");
//! let publisher = Publisher::new(PublishConfig::default(), SchemaVersion::Current);
//! let report = publisher.publish(&store, &mut transport, None, |_| {}).unwrap();
//! println!("published {} tool(s)", report.published.len());
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod measure;
pub mod model;
pub mod publish;
pub mod store;
pub mod transform;

// Re-exports for convenience
pub use config::{PublishConfig, Precision, UnitSystem};
pub use error::{PublishError, Result};
pub use generator::{
    generate_index_page, generate_library_json, generate_tool_json, generate_tool_table_line,
    generate_tool_table_lines, generate_wiki_page, merge_master_table, GeneratedTool,
};
pub use model::{ShapeCatalog, ShapeSchema, ToolRecord};
pub use publish::{PublishReport, Publisher, WikiTransport};
pub use store::{JsonStore, ToolStore};
pub use transform::{map_tool, sanitize_filename, MappedTool, SchemaVersion};
