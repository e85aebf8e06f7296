//! `.fctb` tool definition files and the consolidated library manifest.

use crate::config::PublishConfig;
use crate::error::Result;
use crate::model::{ShapeCatalog, ToolRecord};
use crate::transform::{map_tool, sanitize_filename, SchemaVersion};
use serde_json::json;

/// One generated tool definition, ready to write.
#[derive(Debug)]
pub struct GeneratedTool {
    /// Sanitized `<name>.fctb` filename.
    pub filename: String,
    /// Pretty-printed JSON payload.
    pub bytes: Vec<u8>,
    /// Non-fatal warnings raised while mapping.
    pub warnings: Vec<String>,
}

/// Generate the versioned `.fctb` JSON file for one tool record.
pub fn generate_tool_json(
    record: &ToolRecord,
    catalog: &ShapeCatalog,
    version: SchemaVersion,
    config: &PublishConfig,
) -> Result<GeneratedTool> {
    let mapped = map_tool(record, catalog, version, config);
    let filename = format!("{}.fctb", sanitize_filename(record.display_name()));
    let bytes = serde_json::to_vec_pretty(&mapped.json)?;
    Ok(GeneratedTool {
        filename,
        bytes,
        warnings: mapped.warnings,
    })
}

/// Generate the library manifest mapping tool numbers to their `.fctb`
/// files. Unnamed tools are skipped; they have no stable filename.
pub fn generate_library_json(records: &[ToolRecord]) -> Result<Vec<u8>> {
    let tools: Vec<_> = records
        .iter()
        .filter(|r| {
            r.tool_name
                .as_deref()
                .is_some_and(|name| !name.trim().is_empty())
        })
        .map(|r| {
            json!({
                "nr": r.tool_number,
                "path": format!("{}.fctb", sanitize_filename(r.display_name())),
            })
        })
        .collect();

    Ok(serde_json::to_vec_pretty(&json!({
        "tools": tools,
        "version": 1,
    }))?)
}
