//! Data model types for the tool library.

mod shape;
mod tool;

pub use shape::{map_field_name, NameDirection, ShapeCatalog, ShapeSchema};
pub use tool::ToolRecord;
