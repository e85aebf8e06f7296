//! Tool record definition and lenient store-boundary deserialization.

use crate::config::UnitSystem;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One row of the tools table, validated once at the store boundary.
///
/// Field names serialize to the storage column names, so a plain JSON
/// export of the table loads directly. Sparse shape-specific values live
/// in [`ToolRecord::shape_parameter`] / [`ToolRecord::shape_attribute`];
/// everything else is a direct column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolRecord {
    #[serde(rename = "ToolNumber")]
    pub tool_number: u32,
    #[serde(rename = "ToolName")]
    pub tool_name: Option<String>,
    #[serde(rename = "ToolType")]
    pub tool_type: Option<String>,
    #[serde(rename = "Shape")]
    pub shape: Option<String>,
    #[serde(rename = "ToolShankSize")]
    pub tool_shank_size: Option<String>,
    #[serde(rename = "Flutes")]
    pub flutes: Option<String>,
    #[serde(rename = "OAL")]
    pub oal: Option<String>,
    #[serde(rename = "LOC")]
    pub loc: Option<String>,
    /// `-1` is the "not applicable" sentinel.
    #[serde(rename = "ToolMaxRPM")]
    pub tool_max_rpm: Option<i64>,
    #[serde(rename = "ToolDiameter")]
    pub tool_diameter: Option<String>,
    #[serde(rename = "Stickout")]
    pub stickout: Option<String>,
    #[serde(rename = "ToolMaterial")]
    pub tool_material: Option<String>,
    #[serde(rename = "ToolCoating")]
    pub tool_coating: Option<String>,
    #[serde(rename = "PartNumber")]
    pub part_number: Option<String>,
    #[serde(rename = "ManufacturerName")]
    pub manufacturer_name: Option<String>,
    #[serde(rename = "ToolOrderURL")]
    pub tool_order_url: Option<String>,
    #[serde(rename = "Materials")]
    pub materials: Option<String>,
    #[serde(rename = "SuggestedRPM")]
    pub suggested_rpm: Option<String>,
    #[serde(rename = "SuggestedMaxDOC")]
    pub suggested_max_doc: Option<String>,
    #[serde(rename = "AdditionalNotes")]
    pub additional_notes: Option<String>,
    #[serde(rename = "SuggestedFeedRate")]
    pub suggested_feed_rate: Option<String>,
    #[serde(rename = "ToolImageFileName")]
    pub tool_image_file_name: Option<String>,
    #[serde(rename = "ImageHash")]
    pub image_hash: Option<String>,
    /// Schema parameter values not covered by a direct column.
    #[serde(rename = "ShapeParameter", deserialize_with = "de_json_blob")]
    pub shape_parameter: BTreeMap<String, String>,
    /// Schema attribute values not covered by a direct column.
    #[serde(rename = "ShapeAttribute", deserialize_with = "de_json_blob")]
    pub shape_attribute: BTreeMap<String, String>,
    /// Unit system flag, relevant for schema versions >= 2.2.
    #[serde(rename = "Units", deserialize_with = "de_units")]
    pub units: Option<UnitSystem>,
}

impl ToolRecord {
    /// Tool name with the storage default applied.
    pub fn display_name(&self) -> &str {
        self.tool_name.as_deref().unwrap_or("Unnamed Tool")
    }

    /// Raw shape identifier with the storage default applied.
    pub fn shape_id(&self) -> &str {
        self.shape.as_deref().unwrap_or("unknown")
    }

    /// Image filename, defaulting to `tool_<n>.png`.
    pub fn image_file_name(&self) -> String {
        match self.tool_image_file_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("tool_{}.png", self.tool_number),
        }
    }

    /// Read a direct column value by its storage column name.
    ///
    /// Returns `None` for unknown columns and for columns without a
    /// value, so callers can fall back to the shape blobs.
    pub fn direct_field(&self, column: &str) -> Option<String> {
        match column {
            "ToolNumber" => Some(self.tool_number.to_string()),
            "ToolName" => self.tool_name.clone(),
            "ToolType" => self.tool_type.clone(),
            "Shape" => self.shape.clone(),
            "ToolShankSize" => self.tool_shank_size.clone(),
            "Flutes" => self.flutes.clone(),
            "OAL" => self.oal.clone(),
            "LOC" => self.loc.clone(),
            "ToolMaxRPM" => self.tool_max_rpm.map(|v| v.to_string()),
            "ToolDiameter" => self.tool_diameter.clone(),
            "Stickout" => self.stickout.clone(),
            "ToolMaterial" => self.tool_material.clone(),
            "ToolCoating" => self.tool_coating.clone(),
            "PartNumber" => self.part_number.clone(),
            "ManufacturerName" => self.manufacturer_name.clone(),
            "ToolOrderURL" => self.tool_order_url.clone(),
            "Materials" => self.materials.clone(),
            "SuggestedRPM" => self.suggested_rpm.clone(),
            "SuggestedMaxDOC" => self.suggested_max_doc.clone(),
            "AdditionalNotes" => self.additional_notes.clone(),
            "SuggestedFeedRate" => self.suggested_feed_rate.clone(),
            "ToolImageFileName" => self.tool_image_file_name.clone(),
            "Units" => self.units.map(|u| u.to_string()),
            _ => None,
        }
    }
}

/// Deserialize the `Units` column. The store holds free text, so this
/// goes through the case-insensitive column parser; an unknown value
/// degrades to "not set" with a warning.
fn de_units<'de, D>(deserializer: D) -> Result<Option<UnitSystem>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let parsed = UnitSystem::from_column_str(&s);
        if parsed.is_none() {
            tracing::warn!("Unknown units value '{s}', ignoring");
        }
        parsed
    }))
}

/// Deserialize a `ShapeParameter`/`ShapeAttribute` column.
///
/// The store may hold either a JSON object or the legacy form: a text
/// column containing a JSON blob. A malformed blob degrades to an empty
/// map, never a hard failure.
fn de_json_blob<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(parse_blob(raw))
}

pub(crate) fn parse_blob(raw: Option<serde_json::Value>) -> BTreeMap<String, String> {
    use serde_json::Value;

    match raw {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::String(s)) => blob_from_str(&s),
        Some(Value::Object(map)) => object_to_map(map),
        Some(other) => {
            tracing::warn!("Unexpected shape blob form: {other}, treating as empty");
            BTreeMap::new()
        }
    }
}

fn blob_from_str(s: &str) -> BTreeMap<String, String> {
    if s.trim().is_empty() {
        return BTreeMap::new();
    }
    match serde_json::from_str::<serde_json::Value>(s) {
        Ok(serde_json::Value::Object(map)) => object_to_map(map),
        _ => {
            tracing::warn!("Malformed shape blob '{s}', treating as empty");
            BTreeMap::new()
        }
    }
}

fn object_to_map(map: serde_json::Map<String, serde_json::Value>) -> BTreeMap<String, String> {
    use serde_json::Value;

    map.into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k, s)),
            Value::Number(n) => Some((k, n.to_string())),
            Value::Bool(b) => Some((k, b.to_string())),
            Value::Null => None,
            other => {
                tracing::warn!("Dropping non-scalar shape blob entry {k}: {other}");
                None
            }
        })
        .collect()
}
