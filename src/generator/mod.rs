//! Artifact generators: tool definition files, wiki markup, tool tables.

mod fctb;
mod tool_table;
mod wiki;

pub use fctb::{generate_library_json, generate_tool_json, GeneratedTool};
pub use tool_table::{generate_tool_table_line, generate_tool_table_lines, merge_master_table};
pub use wiki::{generate_index_page, generate_wiki_page};
