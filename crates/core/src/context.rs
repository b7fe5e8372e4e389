//! Tool Execution Context
//!
//! Tools never see the session record or the conversation log. They receive a
//! `ToolContext` carrying the identifiers needed for logging and the directory
//! their datasets live in.

use std::path::{Path, PathBuf};

// ============================================================================
// ExecutionContext Trait
// ============================================================================

/// Read-only view shared by every execution scope.
pub trait ExecutionContext: Send + Sync {
    /// Identifier of the pipeline session this call belongs to.
    fn session_id(&self) -> &str;

    /// Directory holding the tabular datasets.
    fn data_root(&self) -> &Path;

    /// Name of the capability that issued the call.
    fn capability(&self) -> &str;
}

// ============================================================================
// ToolContext
// ============================================================================

/// Context handed to a tool for one invocation.
#[derive(Debug, Clone)]
pub struct ToolContext {
    session_id: String,
    data_root: PathBuf,
    capability: String,
    /// Identifier of the tool call as issued by the model.
    tool_call_id: String,
}

impl ToolContext {
    pub fn new(
        session_id: impl Into<String>,
        data_root: impl Into<PathBuf>,
        capability: impl Into<String>,
        tool_call_id: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            data_root: data_root.into(),
            capability: capability.into(),
            tool_call_id: tool_call_id.into(),
        }
    }

    pub fn tool_call_id(&self) -> &str {
        &self.tool_call_id
    }

    /// Derive a context for another call within the same session.
    pub fn for_call(&self, capability: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            session_id: self.session_id.clone(),
            data_root: self.data_root.clone(),
            capability: capability.into(),
            tool_call_id: tool_call_id.into(),
        }
    }
}

impl ExecutionContext for ToolContext {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn data_root(&self) -> &Path {
        &self.data_root
    }

    fn capability(&self) -> &str {
        &self.capability
    }
}
