//! Tool stores: sources of tool records and shape schemas.

use crate::error::{PublishError, Result};
use crate::model::{ShapeCatalog, ShapeSchema, ToolRecord};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A source of tool records and shape schemas.
///
/// The publisher only talks to this trait, so backends other than the
/// JSON export (a live database, an HTTP API) slot in without touching
/// the pipeline.
pub trait ToolStore {
    /// Fetch records, all of them or one by number. Results come back
    /// sorted by tool number.
    fn tools(&self, tool_number: Option<u32>) -> Result<Vec<ToolRecord>>;

    /// Shape catalog: builtins with store-provided schemas layered on top.
    fn catalog(&self) -> Result<ShapeCatalog>;
}

/// On-disk JSON export of the tools table.
///
/// The file holds `{"tools": [...], "shapes": [...]}` with records keyed
/// by their storage column names. `shapes` is optional; builtin schemas
/// cover the stock geometries.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    tools: Vec<ToolRecord>,
    shapes: Vec<ShapeSchema>,
}

#[derive(Deserialize)]
struct StoreFile {
    #[serde(default)]
    tools: Vec<ToolRecord>,
    #[serde(default)]
    shapes: Vec<ShapeSchema>,
}

impl JsonStore {
    /// Load and validate a store file.
    ///
    /// Duplicate tool numbers are rejected here so every later stage can
    /// assume the number is a unique key.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let file: StoreFile = serde_json::from_str(&text)?;

        let mut tools = file.tools;
        tools.sort_by_key(|t| t.tool_number);

        let mut seen = BTreeSet::new();
        for tool in &tools {
            if !seen.insert(tool.tool_number) {
                return Err(PublishError::InvalidRecord {
                    tool_number: tool.tool_number,
                    message: "duplicate tool number in store".to_string(),
                });
            }
        }

        tracing::debug!(
            path = %path.display(),
            tools = tools.len(),
            shapes = file.shapes.len(),
            "Loaded tool store"
        );

        Ok(Self {
            path: path.to_path_buf(),
            tools,
            shapes: file.shapes,
        })
    }

    /// Path this store was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ToolStore for JsonStore {
    fn tools(&self, tool_number: Option<u32>) -> Result<Vec<ToolRecord>> {
        match tool_number {
            None => Ok(self.tools.clone()),
            Some(n) => {
                let found: Vec<_> = self
                    .tools
                    .iter()
                    .filter(|t| t.tool_number == n)
                    .cloned()
                    .collect();
                if found.is_empty() {
                    return Err(PublishError::InvalidRecord {
                        tool_number: n,
                        message: "tool not found in store".to_string(),
                    });
                }
                Ok(found)
            }
        }
    }

    fn catalog(&self) -> Result<ShapeCatalog> {
        let mut catalog = ShapeCatalog::builtin();
        for schema in &self.shapes {
            catalog.insert(schema.clone());
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn store_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_open_sorts_by_tool_number() {
        let file = store_with(
            r#"{"tools": [
                {"ToolNumber": 30, "ToolName": "B"},
                {"ToolNumber": 2, "ToolName": "A"}
            ]}"#,
        );
        let store = JsonStore::open(file.path()).unwrap();
        let tools = store.tools(None).unwrap();
        assert_eq!(tools[0].tool_number, 2);
        assert_eq!(tools[1].tool_number, 30);
    }

    #[test]
    fn test_single_tool_lookup() {
        let file = store_with(
            r#"{"tools": [
                {"ToolNumber": 5, "ToolName": "A"},
                {"ToolNumber": 7, "ToolName": "B"}
            ]}"#,
        );
        let store = JsonStore::open(file.path()).unwrap();
        let tools = store.tools(Some(7)).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].display_name(), "B");

        let err = store.tools(Some(99)).unwrap_err();
        assert!(matches!(
            err,
            PublishError::InvalidRecord { tool_number: 99, .. }
        ));
    }

    #[test]
    fn test_duplicate_tool_numbers_rejected() {
        let file = store_with(
            r#"{"tools": [
                {"ToolNumber": 5, "ToolName": "A"},
                {"ToolNumber": 5, "ToolName": "B"}
            ]}"#,
        );
        let err = JsonStore::open(file.path()).unwrap_err();
        assert!(matches!(
            err,
            PublishError::InvalidRecord { tool_number: 5, .. }
        ));
    }

    #[test]
    fn test_store_shapes_layer_over_builtins() {
        let file = store_with(
            r#"{
                "tools": [],
                "shapes": [{
                    "ShapeName": "custom.fcstd",
                    "ShapeParameter": ["Diameter"],
                    "ShapeAttribute": ["Flutes"]
                }]
            }"#,
        );
        let store = JsonStore::open(file.path()).unwrap();
        let catalog = store.catalog().unwrap();
        assert!(catalog.resolve("custom.fcstd").is_some());
        assert!(catalog.resolve("endmill.fcstd").is_some());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = JsonStore::open("/no/such/store.json").unwrap_err();
        assert!(matches!(err, PublishError::Io(_)));
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        let file = store_with("{not json");
        let err = JsonStore::open(file.path()).unwrap_err();
        assert!(matches!(err, PublishError::Json(_)));
    }
}
