//! The tool record mapper: flat record + shape schema -> nested tool
//! definition, parameterized by target schema version.

use crate::config::{Precision, PublishConfig};
use crate::error::{PublishError, Result};
use crate::measure::{parse_measurement, render_value};
use crate::model::{map_field_name, NameDirection, ShapeCatalog, ToolRecord};
use crate::transform::sanitize_filename;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Target schema version for the generated tool definition.
///
/// The on-disk `version` field stays `2` for all of these; downstream
/// consumers key behavior off the presence of `shape-type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaVersion {
    /// Split `parameter`/`attribute` sections, raw shape identifiers.
    Legacy,
    /// Attributes merged into parameters, `shape-type` and `id` added.
    #[default]
    Current,
    /// Like `Current`, with a `Units` parameter.
    CurrentPlus,
}

impl std::str::FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legacy" => Ok(SchemaVersion::Legacy),
            "current" => Ok(SchemaVersion::Current),
            "current+" | "current-plus" => Ok(SchemaVersion::CurrentPlus),
            other => Err(format!("Unknown schema version: {other}")),
        }
    }
}

/// Per-version reshaping rules. Version differences live here, not in
/// branches scattered through the traversal.
struct VersionPolicy {
    merge_attributes: bool,
    add_shape_type: bool,
    add_id: bool,
    add_units: bool,
    aliases: &'static [(&'static str, &'static str)],
}

impl SchemaVersion {
    fn policy(self) -> VersionPolicy {
        match self {
            SchemaVersion::Legacy => VersionPolicy {
                merge_attributes: false,
                add_shape_type: false,
                add_id: false,
                add_units: false,
                // Backward-compatible rename kept from the first file format.
                aliases: &[("radius.fcstd", "roundover.fcstd")],
            },
            SchemaVersion::Current => VersionPolicy {
                merge_attributes: true,
                add_shape_type: true,
                add_id: true,
                add_units: false,
                aliases: &[],
            },
            SchemaVersion::CurrentPlus => VersionPolicy {
                merge_attributes: true,
                add_shape_type: true,
                add_id: true,
                add_units: true,
                aliases: &[],
            },
        }
    }
}

impl VersionPolicy {
    fn alias<'a>(&self, shape: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(from, _)| *from == shape)
            .map(|(_, to)| *to)
            .unwrap_or(shape)
    }
}

/// A shape-family derived-field rule: computes `output` from existing
/// record fields and suppresses the raw parameters it replaces.
struct DerivedRule {
    shape: &'static str,
    output: &'static str,
    suppresses: &'static [&'static str],
    compute: fn(&ToolRecord, Precision) -> Result<String>,
}

static DERIVED_RULES: &[DerivedRule] = &[DerivedRule {
    shape: "bullnose.fcstd",
    output: "FlatRadius",
    suppresses: &["NoseRadius"],
    compute: compute_flat_radius,
}];

/// `FlatRadius = Diameter / 2 - NoseRadius`, in the operands' own unit.
fn compute_flat_radius(record: &ToolRecord, precision: Precision) -> Result<String> {
    let diameter_text = record.tool_diameter.as_deref().unwrap_or("0");
    let diameter = parse_measurement(diameter_text).ok_or_else(|| PublishError::InvalidRecord {
        tool_number: record.tool_number,
        message: format!("unparseable diameter '{diameter_text}'"),
    })?;

    let nose_text = record
        .shape_parameter
        .get("NoseRadius")
        .map(String::as_str)
        .unwrap_or("0");
    let nose = parse_measurement(nose_text).ok_or_else(|| PublishError::InvalidRecord {
        tool_number: record.tool_number,
        message: format!("unparseable nose radius '{nose_text}'"),
    })?;

    if diameter.unit != nose.unit {
        return Err(PublishError::UnitMismatch {
            field: "FlatRadius".to_string(),
            left: diameter.unit.to_string(),
            right: nose.unit.to_string(),
        });
    }

    let flat = diameter.value / 2.0 - nose.value;
    Ok(render_value(flat, diameter.unit, precision, false, false))
}

/// Result of mapping one record: the nested tool definition plus any
/// non-fatal warnings raised along the way.
#[derive(Debug)]
pub struct MappedTool {
    pub json: Value,
    pub warnings: Vec<String>,
}

/// Map a flat tool record to its nested, version-specific definition.
///
/// An unresolvable shape degrades to a minimal structure (the raw shape
/// identifier as the only parameter) with a warning; it never fails the
/// record. Derived-field rules run before generic population so they can
/// override or suppress raw parameters; a failing rule drops only that
/// one field.
pub fn map_tool(
    record: &ToolRecord,
    catalog: &ShapeCatalog,
    version: SchemaVersion,
    config: &PublishConfig,
) -> MappedTool {
    let mut warnings = Vec::new();
    let policy = version.policy();
    let raw_shape = record.shape_id();

    let mut parameter = Map::new();
    let mut attribute = Map::new();

    match catalog.resolve(raw_shape) {
        None => {
            let message =
                format!("Shape '{raw_shape}' has no registered schema, emitting minimal definition");
            tracing::warn!(tool = record.tool_number, "{message}");
            warnings.push(message);
            parameter.insert("Shape".to_string(), Value::String(raw_shape.to_string()));
        }
        Some(schema) => {
            let mut suppressed: Vec<&str> = Vec::new();
            for rule in DERIVED_RULES {
                if rule.shape != raw_shape {
                    continue;
                }
                suppressed.extend_from_slice(rule.suppresses);
                match (rule.compute)(record, config.precision) {
                    Ok(value) => {
                        parameter.insert(rule.output.to_string(), Value::String(value));
                    }
                    Err(err) => {
                        let message = format!("Skipping derived field {}: {err}", rule.output);
                        tracing::warn!(tool = record.tool_number, "{message}");
                        warnings.push(message);
                    }
                }
            }

            populate(
                &mut parameter,
                &schema.parameters,
                &suppressed,
                record,
                &record.shape_parameter,
            );
            populate(
                &mut attribute,
                &schema.attributes,
                &suppressed,
                record,
                &record.shape_attribute,
            );
        }
    }

    if policy.merge_attributes {
        for (key, value) in std::mem::take(&mut attribute) {
            parameter.entry(key).or_insert(value);
        }
    }
    if policy.add_units {
        let units = record.units.unwrap_or_default().to_string();
        let entry = parameter
            .entry("Units".to_string())
            .or_insert(Value::Null);
        if entry.is_null() {
            *entry = Value::String(units);
        }
    }

    let mut root = Map::new();
    root.insert("version".to_string(), Value::from(2));
    root.insert(
        "name".to_string(),
        Value::String(record.display_name().to_string()),
    );
    root.insert(
        "shape".to_string(),
        Value::String(policy.alias(raw_shape).to_string()),
    );
    root.insert("parameter".to_string(), Value::Object(parameter));
    root.insert("attribute".to_string(), Value::Object(attribute));
    if policy.add_shape_type {
        root.insert("shape-type".to_string(), Value::String(raw_shape.to_string()));
    }
    if policy.add_id {
        root.insert(
            "id".to_string(),
            Value::String(sanitize_filename(record.display_name())),
        );
    }

    let mut json = Value::Object(root);
    coerce_integers(&mut json);

    MappedTool { json, warnings }
}

/// Populate one output section in schema-declared order. Direct columns
/// win over the shape blob; names already produced by a derived rule are
/// kept unless the record actually carries a value.
fn populate(
    out: &mut Map<String, Value>,
    names: &[String],
    suppressed: &[&str],
    record: &ToolRecord,
    blob: &BTreeMap<String, String>,
) {
    for name in names {
        if suppressed.contains(&name.as_str()) {
            continue;
        }
        let column = map_field_name(name, NameDirection::ToColumn);
        let value = record
            .direct_field(column)
            .or_else(|| blob.get(name).cloned());
        match value {
            Some(v) => {
                out.insert(name.clone(), Value::String(v));
            }
            None => {
                out.entry(name.clone()).or_insert(Value::Null);
            }
        }
    }
}

/// Recursively turn numeric-looking string values (optional sign, all
/// digits) into JSON integers.
fn coerce_integers(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                coerce_integers(v);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                coerce_integers(v);
            }
        }
        Value::String(s) => {
            if let Some(n) = parse_int_like(s) {
                *value = Value::from(n);
            }
        }
        _ => {}
    }
}

fn parse_int_like(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bullnose_record() -> ToolRecord {
        ToolRecord {
            tool_number: 5,
            tool_name: Some("1/4\" Bullnose".to_string()),
            shape: Some("bullnose.fcstd".to_string()),
            tool_diameter: Some("1.0 in".to_string()),
            shape_parameter: [("NoseRadius".to_string(), "0.25 in".to_string())]
                .into_iter()
                .collect(),
            ..Default::default()
        }
    }

    fn map(record: &ToolRecord, version: SchemaVersion) -> MappedTool {
        map_tool(
            record,
            &ShapeCatalog::builtin(),
            version,
            &PublishConfig::default(),
        )
    }

    // ==================== derived field tests ====================

    #[test]
    fn test_bullnose_flat_radius() {
        let mapped = map(&bullnose_record(), SchemaVersion::Current);
        let parameter = &mapped.json["parameter"];
        assert_eq!(parameter["FlatRadius"], "0.2500 in");
        assert!(parameter.get("NoseRadius").is_none());
        assert!(mapped.warnings.is_empty());
    }

    #[test]
    fn test_bullnose_unit_mismatch_drops_only_flat_radius() {
        let mut record = bullnose_record();
        record.shape_parameter
            .insert("NoseRadius".to_string(), "6.35 mm".to_string());

        let mapped = map(&record, SchemaVersion::Current);
        let parameter = &mapped.json["parameter"];
        assert!(parameter.get("FlatRadius").is_none());
        assert!(parameter.get("NoseRadius").is_none());
        // The rest of the record still populates.
        assert_eq!(parameter["Diameter"], "1.0 in");
        assert_eq!(mapped.warnings.len(), 1);
        assert!(mapped.warnings[0].contains("FlatRadius"));
    }

    // ==================== shape resolution tests ====================

    #[test]
    fn test_unknown_shape_degrades_with_warning() {
        let record = ToolRecord {
            tool_number: 9,
            tool_name: Some("Mystery".to_string()),
            shape: Some("unknown_shape".to_string()),
            ..Default::default()
        };
        let mapped = map(&record, SchemaVersion::Legacy);

        assert_eq!(mapped.json["parameter"]["Shape"], "unknown_shape");
        assert_eq!(
            mapped.json["attribute"],
            Value::Object(Map::new())
        );
        assert_eq!(mapped.warnings.len(), 1);
    }

    // ==================== version policy tests ====================

    #[test]
    fn test_legacy_keeps_sections_and_aliases_shape() {
        let record = ToolRecord {
            tool_number: 2,
            tool_name: Some("Roundover".to_string()),
            shape: Some("radius.fcstd".to_string()),
            ..Default::default()
        };
        let mapped = map(&record, SchemaVersion::Legacy);

        assert_eq!(mapped.json["version"], 2);
        assert_eq!(mapped.json["shape"], "roundover.fcstd");
        assert!(mapped.json.get("shape-type").is_none());
        assert!(mapped.json.get("id").is_none());
    }

    #[test]
    fn test_current_merges_attributes_and_adds_metadata() {
        let mut record = bullnose_record();
        record.shape_attribute
            .insert("Chipload".to_string(), "0.002 in".to_string());

        let mapped = map(&record, SchemaVersion::Current);
        assert_eq!(mapped.json["parameter"]["Chipload"], "0.002 in");
        assert_eq!(mapped.json["attribute"], Value::Object(Map::new()));
        assert_eq!(mapped.json["shape-type"], "bullnose.fcstd");
        assert_eq!(mapped.json["id"], "1_4in Bullnose");
        assert!(mapped.json["parameter"].get("Units").is_none());
    }

    #[test]
    fn test_current_plus_adds_units_default() {
        let mapped = map(&bullnose_record(), SchemaVersion::CurrentPlus);
        assert_eq!(mapped.json["parameter"]["Units"], "Imperial");
    }

    // ==================== integer coercion tests ====================

    #[test]
    fn test_numeric_strings_become_integers() {
        let mut record = bullnose_record();
        record.flutes = Some("4".to_string());
        record.shape_attribute
            .insert("Flutes".to_string(), "4".to_string());

        let mapped = map(&record, SchemaVersion::Current);
        assert_eq!(mapped.json["parameter"]["Flutes"], 4);
        // Dimension strings are untouched.
        assert_eq!(mapped.json["parameter"]["Diameter"], "1.0 in");
    }

    #[test]
    fn test_parse_int_like() {
        assert_eq!(parse_int_like("42"), Some(42));
        assert_eq!(parse_int_like("-1"), Some(-1));
        assert_eq!(parse_int_like("0.25"), None);
        assert_eq!(parse_int_like(""), None);
        assert_eq!(parse_int_like("4 in"), None);
    }
}
