//! Capability Routing
//!
//! The routing boundary the pipeline talks to, and its default implementation:
//! a static capability graph driven by an LLM provider.
//!
//! - `capability` - capability definitions and names
//! - `graph` - two-pass graph construction
//! - `prompts` - capability instructions
//! - `router` - `AgentRouter`, the provider-backed boundary
//! - `transfer` - hand-off bookkeeping

pub mod capability;
pub mod graph;
pub mod prompts;
pub mod router;
pub mod transfer;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use siteline_core::{ConversationEntry, UnifiedToolRegistry};
use siteline_tools::{MetricQueryTool, ServiceLookupTool, TabularSource};

use crate::utils::error::AppResult;

pub use capability::Capability;
pub use graph::{default_graph, CapabilityGraph, CapabilityGraphBuilder};
pub use router::AgentRouter;
pub use transfer::TransferChain;

/// One call into the routing boundary.
#[derive(Debug, Clone)]
pub struct RoutingRequest {
    /// Capability that receives the messages first
    pub entry_point: String,
    pub messages: Vec<ConversationEntry>,
    /// Echo streamed text to the operator console
    pub echo: bool,
}

impl RoutingRequest {
    pub fn new(entry_point: impl Into<String>, messages: Vec<ConversationEntry>) -> Self {
        Self {
            entry_point: entry_point.into(),
            messages,
            echo: false,
        }
    }

    pub fn echoed(mut self) -> Self {
        self.echo = true;
        self
    }
}

/// Final answer of a routing call.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingOutcome {
    Text(String),
    /// JSON object from a capability with an output schema
    Structured(Value),
}

impl RoutingOutcome {
    /// The answer as text; structured answers are serialized.
    pub fn into_text(self) -> String {
        match self {
            RoutingOutcome::Text(text) => text,
            RoutingOutcome::Structured(value) => value.to_string(),
        }
    }
}

/// Produces a final answer for a message list, delegating internally as needed.
///
/// `Ok(None)` means the boundary finished without an answer.
#[async_trait]
pub trait RoutingBoundary: Send + Sync {
    async fn route(&self, request: RoutingRequest) -> AppResult<Option<RoutingOutcome>>;
}

/// Registry holding the two query tools over `source`.
pub fn default_tools(source: Arc<dyn TabularSource>) -> UnifiedToolRegistry {
    let mut registry = UnifiedToolRegistry::new();
    registry.register(Arc::new(MetricQueryTool::new(source.clone())));
    registry.register(Arc::new(ServiceLookupTool::new(source)));
    registry
}
