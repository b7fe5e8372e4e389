//! Unified Tool Trait
//!
//! Split definition/execution traits for the deterministic query tools:
//!
//! - `ToolDefinitionTrait` - Identity and input schema
//! - `ToolExecutable` - Execution capability
//! - `UnifiedTool` - Combined trait (auto-implemented via blanket impl)
//! - `UnifiedToolRegistry` - Name lookup with ordered iteration
//!
//! The router only needs the definition half to advertise tools to the model,
//! and only calls into the execution half when the model asks for a tool.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::ToolContext;
use crate::error::{CoreError, CoreResult};

// ============================================================================
// Trait Definitions
// ============================================================================

/// Tool identity and schema.
pub trait ToolDefinitionTrait: Send + Sync {
    /// Unique name the model uses to call this tool (e.g. "query_data").
    fn name(&self) -> &str;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema (draft-07 subset) describing the input object.
    fn parameters_schema(&self) -> Value;
}

/// Tool execution.
#[async_trait]
pub trait ToolExecutable: Send + Sync {
    /// Execute the tool with the given context and arguments.
    ///
    /// Tools facing the model report their own failures as text inside `Ok`;
    /// `Err` is reserved for failures the caller has to see.
    async fn execute(&self, ctx: &ToolContext, args: Value) -> CoreResult<Value>;
}

/// Combined trait for tools that provide both definition and execution.
pub trait UnifiedTool: ToolDefinitionTrait + ToolExecutable {}

impl<T: ToolDefinitionTrait + ToolExecutable> UnifiedTool for T {}

// ============================================================================
// UnifiedToolRegistry
// ============================================================================

/// Registry of tools available to the capability graph.
pub struct UnifiedToolRegistry {
    tools: HashMap<String, Arc<dyn UnifiedTool>>,
    /// Insertion order for deterministic iteration.
    order: Vec<String>,
}

impl UnifiedToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn UnifiedTool>) {
        let name = tool.name().to_string();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn UnifiedTool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool definitions as JSON values in registration order.
    pub fn definitions(&self) -> Vec<Value> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "parameters": tool.parameters_schema(),
                })
            })
            .collect()
    }

    /// Execute a tool by name.
    ///
    /// Returns `Err(CoreError::NotFound)` if the tool is not registered.
    pub async fn execute(&self, name: &str, ctx: &ToolContext, args: Value) -> CoreResult<Value> {
        match self.tools.get(name) {
            Some(tool) => tool.execute(ctx, args).await,
            None => Err(CoreError::not_found(format!("Tool not found: {}", name))),
        }
    }
}

impl Default for UnifiedToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
