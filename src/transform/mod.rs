//! Record-to-artifact transformations.

mod mapper;
mod sanitize;

pub use mapper::{map_tool, MappedTool, SchemaVersion};
pub use sanitize::sanitize_filename;
