//! Tool Error Types
//!
//! Failures raised inside the query tools. None of them cross the tool
//! boundary as errors: `sentinel()` turns each into the text the model sees.

use std::path::PathBuf;

use thiserror::Error;

/// Returned when a metric query matches no rows.
pub const NO_MATCHING_DATA: &str = "no matching data for the given conditions";

/// Returned when a service lookup matches no site.
pub const NO_MATCHING_SITE: &str = "no matching site for the given site_id";

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{field} must be a YYYY-MM-DD date, got {value:?}")]
    InvalidDateFormat { field: &'static str, value: String },

    #[error("at least one column must be specified")]
    MissingColumns,

    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    #[error("site_id must not be empty")]
    MissingSiteIdentifier,

    #[error("malformed arguments: {0}")]
    InvalidArguments(String),

    #[error("{} is missing at {}", .file, .path.display())]
    SourceUnavailable { file: String, path: PathBuf },

    #[error("malformed dataset: {0}")]
    MalformedSource(String),

    #[error("{0}")]
    Unexpected(String),
}

pub type ToolResult<T> = Result<T, ToolError>;

impl ToolError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedSource(msg.into())
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }

    /// Validation-class failures caused by the caller's arguments.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ToolError::InvalidDateFormat { .. }
                | ToolError::MissingColumns
                | ToolError::UnknownColumn(_)
                | ToolError::MissingSiteIdentifier
                | ToolError::InvalidArguments(_)
        )
    }

    /// Text handed back to the model in place of this error.
    pub fn sentinel(&self) -> String {
        match self {
            ToolError::SourceUnavailable { file, .. } => format!("data file not found: {}", file),
            e if e.is_validation() => format!("invalid input: {}", e),
            e => format!("unexpected error: {}", e),
        }
    }
}

impl From<csv::Error> for ToolError {
    fn from(err: csv::Error) -> Self {
        ToolError::MalformedSource(err.to_string())
    }
}
