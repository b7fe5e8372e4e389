//! Unified Stream Event Types
//!
//! Provider-agnostic events emitted while a capability is producing output.
//! The LLM crate converts wire chunks into these; the application forwards
//! them to the console renderer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified streaming event that all provider adapters convert to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnifiedStreamEvent {
    /// Text content delta from the model
    TextDelta { content: String },

    /// End of one assistant content part
    TextDone,

    /// Start of a tool call
    ToolStart { tool_id: String, tool_name: String },

    /// Tool call complete with accumulated arguments
    ToolComplete {
        tool_id: String,
        tool_name: String,
        /// Complete JSON string of tool arguments
        arguments: String,
    },

    /// Tool execution result
    ToolResult {
        tool_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Token usage information
    Usage { input_tokens: u32, output_tokens: u32 },

    /// Error during streaming
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    /// Stream complete
    Complete {
        #[serde(skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },

    // ========================================================================
    // Capability transfer events
    // ========================================================================
    /// Control is being handed to another capability.
    AgentTransferStart {
        from_agent: String,
        to_agent: String,
        depth: usize,
    },

    /// A capability finished and returned a final answer.
    AgentTransferEnd {
        from_agent: String,
        to_agent: String,
        success: bool,
    },
}

/// Errors produced while adapting a provider stream.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdapterError {
    /// Invalid format that couldn't be parsed
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// JSON/data parsing error
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Converts one provider's stream lines into unified events.
pub trait StreamAdapter: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Adapt a raw stream line. One line may yield zero or more events.
    fn adapt(&mut self, input: &str) -> Result<Vec<UnifiedStreamEvent>, AdapterError>;

    /// Reset adapter state for a new stream.
    fn reset(&mut self) {}
}
