//! Shape schemas and the internal/external field-name mapping.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Mapping direction for [`map_field_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameDirection {
    /// Schema parameter name to storage column name.
    ToColumn,
    /// Storage column name to schema parameter name.
    ToSchema,
}

/// Fixed rename table between schema parameter names and the direct
/// storage columns that back them. Pairs are (schema name, column name).
const NAME_TABLE: &[(&str, &str)] = &[
    ("Diameter", "ToolDiameter"),
    ("Length", "OAL"),
    ("CuttingEdgeHeight", "LOC"),
    ("Material", "ToolMaterial"),
    ("ShankDiameter", "ToolShankSize"),
];

/// Rename a field between the schema and storage vocabularies.
///
/// Names outside the table pass through unchanged, so the mapping
/// round-trips to identity in both directions.
pub fn map_field_name(name: &str, direction: NameDirection) -> &str {
    for (schema, column) in NAME_TABLE {
        match direction {
            NameDirection::ToColumn if *schema == name => return column,
            NameDirection::ToSchema if *column == name => return schema,
            _ => {}
        }
    }
    name
}

/// One tool geometry family: its ordered parameter and attribute names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeSchema {
    #[serde(rename = "ShapeName")]
    pub shape_name: String,
    /// Ordered parameter names, as declared by the schema.
    #[serde(rename = "ShapeParameter", deserialize_with = "de_name_list")]
    pub parameters: Vec<String>,
    /// Ordered attribute names.
    #[serde(rename = "ShapeAttribute", deserialize_with = "de_name_list")]
    pub attributes: Vec<String>,
}

impl ShapeSchema {
    fn new(name: &str, parameters: &[&str], attributes: &[&str]) -> Self {
        Self {
            shape_name: name.to_string(),
            parameters: parameters.iter().map(|s| s.to_string()).collect(),
            attributes: attributes.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The shape name lists are stored either as JSON arrays or as the
/// legacy text-column form containing a JSON blob.
fn de_name_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => match serde_json::from_str::<Vec<String>>(&s) {
            Ok(names) => names,
            Err(_) => {
                tracing::warn!("Malformed shape name list '{s}', treating as empty");
                Vec::new()
            }
        },
        Some(other) => {
            tracing::warn!("Unexpected shape name list form: {other}");
            Vec::new()
        }
    })
}

/// Shape schema resolver: exact-name lookup over registered schemas.
#[derive(Debug, Clone, Default)]
pub struct ShapeCatalog {
    schemas: BTreeMap<String, ShapeSchema>,
}

impl ShapeCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the stock tool geometry families. Store-provided rows
    /// layered on top via [`ShapeCatalog::insert`] take precedence.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        let geometry = &[
            "CuttingEdgeHeight",
            "Diameter",
            "Length",
            "ShankDiameter",
        ][..];
        let stock: &[ShapeSchema] = &[
            ShapeSchema::new(
                "endmill.fcstd",
                geometry,
                &[
                    "Chipload",
                    "Flutes",
                    "Material",
                    "SpindleDirection",
                    "Stickout",
                ],
            ),
            ShapeSchema::new(
                "ballend.fcstd",
                geometry,
                &["Chipload", "Flutes", "Material", "Stickout"],
            ),
            ShapeSchema::new(
                "v-bit.fcstd",
                &[
                    "CuttingEdgeAngle",
                    "CuttingEdgeHeight",
                    "Diameter",
                    "Length",
                    "ShankDiameter",
                    "TipDiameter",
                ],
                &["Chipload", "Flutes", "Material", "Stickout"],
            ),
            ShapeSchema::new(
                "torus.fcstd",
                &[
                    "CuttingEdgeHeight",
                    "Diameter",
                    "Length",
                    "ShankDiameter",
                    "TorusRadius",
                ],
                &[
                    "Chipload",
                    "Flutes",
                    "Material",
                    "SpindleDirection",
                    "Stickout",
                ],
            ),
            ShapeSchema::new(
                "drill.fcstd",
                &["Diameter", "Length", "TipAngle"],
                &["Chipload", "Material", "Stickout"],
            ),
            ShapeSchema::new(
                "slittingsaw.fcstd",
                &[
                    "BladeThickness",
                    "CapDiameter",
                    "CapHeight",
                    "Diameter",
                    "Length",
                    "ShankDiameter",
                ],
                &["Chipload", "Flutes", "Material"],
            ),
            ShapeSchema::new(
                "probe.fcstd",
                &["Diameter", "Length", "ShaftDiameter"],
                &["Material", "SpindlePower"],
            ),
            ShapeSchema::new(
                "roundover.fcstd",
                &[
                    "CuttingEdgeHeight",
                    "CuttingRadius",
                    "Diameter",
                    "Length",
                    "ShankDiameter",
                    "TipDiameter",
                ],
                &["Chipload", "Flutes", "Material", "Stickout"],
            ),
            ShapeSchema::new(
                "bullnose.fcstd",
                &[
                    "CuttingEdgeHeight",
                    "Diameter",
                    "FlatRadius",
                    "Length",
                    "NoseRadius",
                    "ShankDiameter",
                ],
                &["Chipload", "Flutes", "Material", "Stickout"],
            ),
        ];
        for schema in stock {
            catalog.insert(schema.clone());
        }
        catalog
    }

    /// Register or replace a schema.
    pub fn insert(&mut self, schema: ShapeSchema) {
        self.schemas.insert(schema.shape_name.clone(), schema);
    }

    /// Look up a schema by exact name. A missing shape is signalled, not
    /// raised; callers fall back to a minimal degraded output.
    pub fn resolve(&self, shape_name: &str) -> Option<&ShapeSchema> {
        self.schemas.get(shape_name)
    }
}
