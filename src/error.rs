//! Error types for the tool-library publishing pipeline.

use thiserror::Error;

/// Error codes for publishing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Store file not found or unreadable (-1)
    StoreUnavailable = -1,
    /// Malformed store contents (-2)
    MalformedStore = -2,
    /// Unit mismatch in a derived-field computation (E101)
    UnitMismatch = 101,
    /// Tool record rejected at the store boundary (E102)
    InvalidRecord = 102,
    /// Wiki upload rejected (E200)
    WikiUpload = 200,
    /// Master tool table could not be merged (E201)
    ToolTableMerge = 201,
}

/// Main error type for the publisher.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Unit mismatch computing {field}: {left} vs {right}")]
    UnitMismatch {
        field: String,
        left: String,
        right: String,
    },

    #[error("Invalid tool record {tool_number}: {message}")]
    InvalidRecord { tool_number: u32, message: String },

    #[error("Wiki upload of '{title}' failed: {message}")]
    WikiUpload { title: String, message: String },

    #[error("Media upload of '{filename}' failed: {message}")]
    MediaUpload { filename: String, message: String },

    #[error("Master tool table is empty or has no data lines")]
    EmptyMasterTable,

    #[error("Malformed tool table line: {line}")]
    MalformedTableLine { line: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PublishError {
    /// Get the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PublishError::UnitMismatch { .. } => ErrorCode::UnitMismatch,
            PublishError::InvalidRecord { .. } => ErrorCode::InvalidRecord,
            PublishError::WikiUpload { .. } => ErrorCode::WikiUpload,
            PublishError::MediaUpload { .. } => ErrorCode::WikiUpload,
            PublishError::EmptyMasterTable => ErrorCode::ToolTableMerge,
            PublishError::MalformedTableLine { .. } => ErrorCode::ToolTableMerge,
            PublishError::Io(_) => ErrorCode::StoreUnavailable,
            PublishError::Json(_) => ErrorCode::MalformedStore,
        }
    }

    /// Get the numeric error code value.
    pub fn code_value(&self) -> i32 {
        self.code() as i32
    }
}

/// Result type alias for publisher operations.
pub type Result<T> = std::result::Result<T, PublishError>;
