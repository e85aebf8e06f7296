//! Configuration constants and settings for the publisher.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Conversion factor: mm to inch.
pub const CONV_MM_INCH: f64 = 25.4;

/// Largest denominator used when rendering inch values as fractions.
pub const MAX_FRACTION_DENOMINATOR: u64 = 64;

/// Decimal places for imperial dimension output.
pub const DEFAULT_IMPERIAL_PRECISION: usize = 4;

/// Decimal places for metric dimension output.
pub const DEFAULT_METRIC_PRECISION: usize = 3;

/// Sentinel stored in `ToolMaxRPM` meaning "not applicable".
pub const RPM_NOT_APPLICABLE: i64 = -1;

/// Default spindle ceiling used for the tool-table U-field policy.
pub const DEFAULT_MACHINE_MAX_RPM: i64 = 24_000;

/// Unit system recorded on a tool record (schema versions >= 2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

impl UnitSystem {
    /// Parse the stored `Units` column value.
    pub fn from_column_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "imperial" => Some(UnitSystem::Imperial),
            "metric" => Some(UnitSystem::Metric),
            _ => None,
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitSystem::Imperial => write!(f, "Imperial"),
            UnitSystem::Metric => write!(f, "Metric"),
        }
    }
}

/// Decimal precision applied when rendering dimension values.
#[derive(Debug, Clone, Copy)]
pub struct Precision {
    pub imperial: usize,
    pub metric: usize,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            imperial: DEFAULT_IMPERIAL_PRECISION,
            metric: DEFAULT_METRIC_PRECISION,
        }
    }
}

/// Publisher configuration, passed explicitly into each component call.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Spindle ceiling of the target machine; RPM overrides equal to it
    /// collapse to `U0` in the tool table.
    pub machine_max_rpm: i64,
    /// Wiki title of the library index page.
    pub index_page: String,
    /// Per-tool page title prefix (pages are `<index_page>/<prefix>_<n>`).
    pub page_prefix: String,
    /// Directory receiving generated `.fctb` files.
    pub bits_dir: PathBuf,
    /// Path of the consolidated library manifest.
    pub library_file: PathBuf,
    /// Directory holding tool images to upload, if any.
    pub images_dir: Option<PathBuf>,
    /// Decimal precision for dimension output.
    pub precision: Precision,
    /// Tool numbers the master tool-table merge must never overwrite.
    pub merge_exceptions: Vec<u32>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            machine_max_rpm: DEFAULT_MACHINE_MAX_RPM,
            index_page: "Nibblerbot/tools".to_string(),
            page_prefix: "tool".to_string(),
            bits_dir: PathBuf::from("Bit"),
            library_file: PathBuf::from("Library/tools.json"),
            images_dir: None,
            precision: Precision::default(),
            merge_exceptions: vec![100],
        }
    }
}

impl PublishConfig {
    /// Wiki page title for one tool.
    pub fn page_title(&self, tool_number: u32) -> String {
        format!("{}/{}_{}", self.index_page, self.page_prefix, tool_number)
    }
}
