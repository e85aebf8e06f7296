//! Batch publishing: drives the generators against a store and pushes
//! the results through a wiki transport.

use crate::config::PublishConfig;
use crate::error::{PublishError, Result};
use crate::generator::{
    generate_index_page, generate_library_json, generate_tool_json,
    generate_tool_table_lines, generate_wiki_page, merge_master_table,
};
use crate::model::{ShapeCatalog, ToolRecord};
use crate::store::ToolStore;
use crate::transform::SchemaVersion;
use std::fs;
use std::path::{Path, PathBuf};

/// Destination for rendered wiki content.
///
/// The live backend speaks the MediaWiki API; [`DirTransport`] writes
/// pages to a directory for offline runs and tests.
pub trait WikiTransport {
    /// Create or overwrite a page.
    fn upload_page(&mut self, title: &str, content: &str) -> Result<()>;

    /// Upload a media file, overwriting any existing version.
    fn upload_media(&mut self, filename: &str, bytes: &[u8]) -> Result<()>;

    /// Remove a page, succeeding if it is already gone.
    fn delete_page(&mut self, title: &str) -> Result<()>;
}

/// Transport that writes pages and media into a local directory.
///
/// Page titles become `<title>.wiki` filenames with path separators
/// flattened to `_`.
#[derive(Debug)]
pub struct DirTransport {
    dir: PathBuf,
}

impl DirTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn page_path(&self, title: &str) -> PathBuf {
        self.dir.join(format!("{}.wiki", title.replace('/', "_")))
    }
}

impl WikiTransport for DirTransport {
    fn upload_page(&mut self, title: &str, content: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.page_path(title), content)?;
        Ok(())
    }

    fn upload_media(&mut self, filename: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(filename), bytes)?;
        Ok(())
    }

    fn delete_page(&mut self, title: &str) -> Result<()> {
        let path = self.page_path(title);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// One tool that failed to publish.
#[derive(Debug)]
pub struct PublishFailure {
    pub tool_number: u32,
    pub message: String,
}

/// Outcome of a batch run. A failed tool never aborts the batch; it
/// lands here instead.
#[derive(Debug, Default)]
pub struct PublishReport {
    /// Tool numbers published successfully, in processing order.
    pub published: Vec<u32>,
    /// Tools that failed, with the error message.
    pub failures: Vec<PublishFailure>,
    /// Non-fatal warnings accumulated across all tools.
    pub warnings: Vec<String>,
}

impl PublishReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The publishing pipeline: store records in, wiki pages, `.fctb` files,
/// the index page and the library manifest out.
pub struct Publisher {
    config: PublishConfig,
    version: SchemaVersion,
}

impl Publisher {
    pub fn new(config: PublishConfig, version: SchemaVersion) -> Self {
        Self { config, version }
    }

    /// Publish all tools, or a single one by number.
    ///
    /// `progress` receives percentages: the per-tool loop covers 0-90,
    /// the index page and library manifest bring it to 100.
    pub fn publish(
        &self,
        store: &dyn ToolStore,
        transport: &mut dyn WikiTransport,
        tool_number: Option<u32>,
        mut progress: impl FnMut(u8),
    ) -> Result<PublishReport> {
        let records = store.tools(tool_number)?;
        let catalog = store.catalog()?;
        let total = records.len();

        let mut report = PublishReport::default();
        for (idx, record) in records.iter().enumerate() {
            progress(((idx + 1) * 90 / total.max(1)) as u8);

            match self.publish_tool(record, &catalog, transport) {
                Ok(warnings) => {
                    report.published.push(record.tool_number);
                    report.warnings.extend(warnings);
                }
                Err(err) => {
                    tracing::error!(
                        tool = record.tool_number,
                        error = %err,
                        "Failed to publish tool"
                    );
                    report.failures.push(PublishFailure {
                        tool_number: record.tool_number,
                        message: err.to_string(),
                    });
                }
            }
        }

        // Index and manifest always reflect the full store, even when a
        // single tool was requested.
        let all_records = if tool_number.is_some() {
            store.tools(None)?
        } else {
            records
        };
        let index = generate_index_page(&all_records, &self.config);
        transport.upload_page(&self.config.index_page, &index)?;

        if let Some(parent) = self.config.library_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(
            &self.config.library_file,
            generate_library_json(&all_records)?,
        )?;

        progress(100);
        tracing::info!(
            published = report.published.len(),
            failed = report.failures.len(),
            "Publish run finished"
        );
        Ok(report)
    }

    /// Publish one tool: `.fctb` file, wiki page, image when available.
    fn publish_tool(
        &self,
        record: &ToolRecord,
        catalog: &ShapeCatalog,
        transport: &mut dyn WikiTransport,
    ) -> Result<Vec<String>> {
        let generated = generate_tool_json(record, catalog, self.version, &self.config)?;

        fs::create_dir_all(&self.config.bits_dir)?;
        fs::write(self.config.bits_dir.join(&generated.filename), &generated.bytes)?;

        let page = generate_wiki_page(record, &self.config);
        transport.upload_page(&self.config.page_title(record.tool_number), &page)?;

        if let Some(images_dir) = &self.config.images_dir {
            let image_name = record.image_file_name();
            let image_path = images_dir.join(&image_name);
            if image_path.exists() {
                let bytes = fs::read(&image_path)?;
                transport
                    .upload_media(&image_name, &bytes)
                    .map_err(|err| PublishError::MediaUpload {
                        filename: image_name.clone(),
                        message: err.to_string(),
                    })?;
            } else {
                tracing::debug!(
                    tool = record.tool_number,
                    image = %image_path.display(),
                    "Image file not found, skipping upload"
                );
            }
        }

        Ok(generated.warnings)
    }
}

/// Write tool-table update lines and optionally merge them into a master
/// table in place.
///
/// The lines always cover the full store, regardless of any tool filter
/// used for publishing: the merge drops master tools missing from the
/// update, so a partial line set would truncate the hand-maintained
/// master table.
pub fn refresh_tool_table(
    store: &dyn ToolStore,
    config: &PublishConfig,
    table_path: &Path,
    master_path: Option<&Path>,
) -> Result<()> {
    let records = store.tools(None)?;
    let lines = generate_tool_table_lines(&records, config.machine_max_rpm);
    fs::write(table_path, lines.join("\n") + "\n")?;
    tracing::info!(path = %table_path.display(), "Tool table written");

    if let Some(master_path) = master_path {
        let master_text = fs::read_to_string(master_path)?;
        let merged = merge_master_table(&master_text, &lines, &config.merge_exceptions)?;
        fs::write(master_path, merged)?;
        tracing::info!(path = %master_path.display(), "Master tool table updated");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishError;
    use crate::store::JsonStore;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    /// Transport that records uploads, optionally failing chosen titles
    /// or all media.
    #[derive(Default)]
    struct MockTransport {
        pages: Vec<(String, String)>,
        media: Vec<String>,
        fail_titles: Vec<String>,
        fail_media: bool,
    }

    impl WikiTransport for MockTransport {
        fn upload_page(&mut self, title: &str, content: &str) -> Result<()> {
            if self.fail_titles.iter().any(|t| t == title) {
                return Err(PublishError::WikiUpload {
                    title: title.to_string(),
                    message: "simulated failure".to_string(),
                });
            }
            self.pages.push((title.to_string(), content.to_string()));
            Ok(())
        }

        fn upload_media(&mut self, filename: &str, _bytes: &[u8]) -> Result<()> {
            if self.fail_media {
                return Err(PublishError::Io(std::io::Error::other("connection reset")));
            }
            self.media.push(filename.to_string());
            Ok(())
        }

        fn delete_page(&mut self, _title: &str) -> Result<()> {
            Ok(())
        }
    }

    fn sample_store() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"tools": [
                {"ToolNumber": 1, "ToolName": "Alpha", "Shape": "endmill.fcstd",
                 "ToolDiameter": "0.25 in", "ToolMaxRPM": 18000},
                {"ToolNumber": 2, "ToolName": "Beta", "Shape": "ballend.fcstd",
                 "ToolDiameter": "0.125 in"}
            ]}"#,
        )
        .unwrap();
        file
    }

    fn test_config(dir: &std::path::Path) -> PublishConfig {
        PublishConfig {
            bits_dir: dir.join("Bit"),
            library_file: dir.join("Library/tools.json"),
            ..Default::default()
        }
    }

    #[test]
    fn test_publish_all_tools() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(sample_store().path()).unwrap();
        let mut transport = MockTransport::default();

        let publisher = Publisher::new(test_config(dir.path()), SchemaVersion::Current);
        let report = publisher
            .publish(&store, &mut transport, None, |_| {})
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.published, vec![1, 2]);
        // Two tool pages plus the index page.
        assert_eq!(transport.pages.len(), 3);
        assert_eq!(transport.pages[0].0, "Nibblerbot/tools/tool_1");
        assert_eq!(transport.pages[2].0, "Nibblerbot/tools");

        assert!(dir.path().join("Bit/Alpha.fctb").exists());
        assert!(dir.path().join("Bit/Beta.fctb").exists());
        assert!(dir.path().join("Library/tools.json").exists());
    }

    #[test]
    fn test_publish_partial_failure_continues() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(sample_store().path()).unwrap();
        let mut transport = MockTransport {
            fail_titles: vec!["Nibblerbot/tools/tool_1".to_string()],
            ..Default::default()
        };

        let publisher = Publisher::new(test_config(dir.path()), SchemaVersion::Current);
        let report = publisher
            .publish(&store, &mut transport, None, |_| {})
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.published, vec![2]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].tool_number, 1);
    }

    #[test]
    fn test_publish_single_tool_still_rebuilds_index() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(sample_store().path()).unwrap();
        let mut transport = MockTransport::default();

        let publisher = Publisher::new(test_config(dir.path()), SchemaVersion::Current);
        let report = publisher
            .publish(&store, &mut transport, Some(2), |_| {})
            .unwrap();

        assert_eq!(report.published, vec![2]);
        let (_, index) = transport.pages.last().unwrap();
        // Index lists every tool in the store, not just the one published.
        assert!(index.contains("Tool 1 - Alpha"));
        assert!(index.contains("Tool 2 - Beta"));
    }

    #[test]
    fn test_progress_reaches_100() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(sample_store().path()).unwrap();
        let mut transport = MockTransport::default();
        let mut seen = Vec::new();

        let publisher = Publisher::new(test_config(dir.path()), SchemaVersion::Current);
        publisher
            .publish(&store, &mut transport, None, |p| seen.push(p))
            .unwrap();

        assert_eq!(seen, vec![45, 90, 100]);
    }

    #[test]
    fn test_media_upload_failure_reported() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(sample_store().path()).unwrap();
        let mut transport = MockTransport {
            fail_media: true,
            ..Default::default()
        };

        let images_dir = dir.path().join("images");
        fs::create_dir_all(&images_dir).unwrap();
        fs::write(images_dir.join("tool_1.png"), b"png").unwrap();

        let config = PublishConfig {
            images_dir: Some(images_dir),
            ..test_config(dir.path())
        };
        let publisher = Publisher::new(config, SchemaVersion::Current);
        let report = publisher
            .publish(&store, &mut transport, None, |_| {})
            .unwrap();

        // Tool 1 fails on its image, tool 2 has no image and goes through.
        assert_eq!(report.published, vec![2]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].tool_number, 1);
        assert!(report.failures[0].message.contains("tool_1.png"));
    }

    #[test]
    fn test_tool_table_refresh_covers_full_store() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(sample_store().path()).unwrap();
        let table_path = dir.path().join("update-tool.tbl");
        let master_path = dir.path().join("tool.tbl");
        fs::write(
            &master_path,
            ";Master tool table\n\
             T1     P1     Z+1.000000   D+0.100000   U0    ; Alpha\n\
             T2     P2     Z+2.000000   D+0.200000   U0    ; Beta\n",
        )
        .unwrap();

        // Even after a single-tool publish, the merge must see every
        // tool in the store or the rest of the master table vanishes.
        let mut transport = MockTransport::default();
        let publisher = Publisher::new(test_config(dir.path()), SchemaVersion::Current);
        publisher
            .publish(&store, &mut transport, Some(1), |_| {})
            .unwrap();

        refresh_tool_table(
            &store,
            &test_config(dir.path()),
            &table_path,
            Some(&master_path),
        )
        .unwrap();

        let table = fs::read_to_string(&table_path).unwrap();
        assert!(table.contains("T1 "));
        assert!(table.contains("T2 "));

        let master = fs::read_to_string(&master_path).unwrap();
        assert!(master.contains("T1     P1     Z+1.000000   D+0.250000   U18000 ; Alpha"));
        assert!(master.contains("T2     P2     Z+2.000000   D+0.125000   U0    ; Beta"));
    }

    #[test]
    fn test_dir_transport_writes_pages() {
        let dir = tempdir().unwrap();
        let mut transport = DirTransport::new(dir.path());
        transport
            .upload_page("Nibblerbot/tools/tool_1", "content")
            .unwrap();
        let path = dir.path().join("Nibblerbot_tools_tool_1.wiki");
        assert_eq!(fs::read_to_string(&path).unwrap(), "content");

        transport.delete_page("Nibblerbot/tools/tool_1").unwrap();
        assert!(!path.exists());
    }
}
