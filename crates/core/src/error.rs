//! Core Error Types
//!
//! Failures of the tool traits and the tool registry. Dataset and provider
//! failures have their own error types in their crates.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Arguments a tool cannot work with
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown tool
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CoreError::validation("columns must not be empty");
        assert_eq!(err.to_string(), "Validation error: columns must not be empty");

        let err = CoreError::not_found("Tool not found: query_data");
        assert_eq!(err.to_string(), "Not found: Tool not found: query_data");
    }

    #[test]
    fn test_serde_error_conversion() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json");
        let err: CoreError = bad.unwrap_err().into();
        assert!(matches!(err, CoreError::Serialization(_)));
    }
}
