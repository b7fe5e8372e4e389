//! Siteline Core
//!
//! Foundational traits and types shared by every crate in the Siteline workspace.
//! Nothing here knows about LLM providers, CSV files, or the terminal.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `context` - Tool execution context (`ExecutionContext`, `ToolContext`)
//! - `tool_trait` - Unified tool abstraction (`ToolDefinitionTrait`, `ToolExecutable`, `UnifiedTool`)
//! - `conversation` - Append-only conversation log shared across pipeline phases
//! - `streaming` - Unified stream event types and adapter trait

pub mod context;
pub mod conversation;
pub mod error;
pub mod streaming;
pub mod tool_trait;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Context ────────────────────────────────────────────────────────────
pub use context::{ExecutionContext, ToolContext};

// ── Unified Tool Trait ─────────────────────────────────────────────────
pub use tool_trait::{ToolDefinitionTrait, ToolExecutable, UnifiedTool, UnifiedToolRegistry};

// ── Conversation Log ───────────────────────────────────────────────────
pub use conversation::{ConversationEntry, ConversationLog, EntryRole};

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::{AdapterError, StreamAdapter, UnifiedStreamEvent};
