//! Error Handling
//!
//! Unified error types for the application.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use siteline_core::CoreError;
use siteline_llm::LlmError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Input or intermediate state failed a check
    #[error("Validation error: {0}")]
    Validation(String),

    /// The routing boundary produced no result
    #[error("No response: {0}")]
    NoResponse(String),

    /// A structured reply could not be parsed
    #[error("Malformed candidate: {0}")]
    MalformedCandidate(String),

    /// An interactive loop ran out of rounds
    #[error("Gave up after {rounds} rounds: {what}")]
    RetriesExhausted { what: String, rounds: u32 },

    /// The operator asked to stop
    #[error("Cancelled by operator")]
    Cancelled,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider failures
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool registry failures
    #[error("Tool error: {0}")]
    Core(#[from] CoreError),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn no_response(msg: impl Into<String>) -> Self {
        Self::NoResponse(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedCandidate(msg.into())
    }

    pub fn exhausted(what: impl Into<String>, rounds: u32) -> Self {
        Self::RetriesExhausted {
            what: what.into(),
            rounds,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Failures a phase absorbs: logged, output left unset, pipeline continues.
    pub fn is_phase_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::NoResponse(_)
                | AppError::MalformedCandidate(_)
                | AppError::RetriesExhausted { .. }
        )
    }
}

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
