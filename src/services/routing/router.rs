//! Agent Router
//!
//! Drives the capability graph against an LLM provider. Each turn sends the
//! active capability's instructions, the transcript so far, its tools and one
//! `transfer_to_<target>` pseudo-tool per delegation edge. Tool calls are
//! executed and fed back; a transfer switches the active capability and keeps
//! the transcript. A reply without tool calls ends the call.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use siteline_core::{
    ConversationEntry, EntryRole, ToolContext, ToolDefinitionTrait, UnifiedStreamEvent,
    UnifiedToolRegistry,
};
use siteline_llm::{
    LlmProvider, LlmRequestOptions, LlmResponse, Message, ParameterSchema, ToolCall,
    ToolDefinition,
};

use crate::services::stream_render::{spawn_renderer, stdout_writer, EchoWriterFactory};
use crate::utils::error::{AppError, AppResult};

use super::capability::{transfer_tool_name, Capability, TRANSFER_PREFIX};
use super::graph::CapabilityGraph;
use super::transfer::TransferChain;
use super::{RoutingBoundary, RoutingOutcome, RoutingRequest};

/// Model turns one routing call may take before giving up.
pub const DEFAULT_MAX_TURNS: u32 = 12;

pub struct AgentRouter {
    provider: Arc<dyn LlmProvider>,
    graph: Arc<CapabilityGraph>,
    tools: Arc<UnifiedToolRegistry>,
    session_id: String,
    data_root: PathBuf,
    max_turns: u32,
    echo_writer: EchoWriterFactory,
}

impl AgentRouter {
    /// Every tool a capability names must be registered.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        graph: Arc<CapabilityGraph>,
        tools: Arc<UnifiedToolRegistry>,
    ) -> AppResult<Self> {
        for capability in graph.capabilities() {
            if let Some(missing) = capability.tools().iter().find(|t| !tools.contains(t)) {
                return Err(AppError::config(format!(
                    "capability '{}' uses unregistered tool '{}'",
                    capability.name(),
                    missing
                )));
            }
        }
        Ok(Self {
            provider,
            graph,
            tools,
            session_id: String::new(),
            data_root: PathBuf::from("."),
            max_turns: DEFAULT_MAX_TURNS,
            echo_writer: stdout_writer(),
        })
    }

    /// Identifiers handed to tools through their context.
    pub fn with_session(mut self, session_id: impl Into<String>, data_root: impl Into<PathBuf>) -> Self {
        self.session_id = session_id.into();
        self.data_root = data_root.into();
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_echo_writer(mut self, echo_writer: EchoWriterFactory) -> Self {
        self.echo_writer = echo_writer;
        self
    }

    fn capability(&self, name: &str) -> AppResult<&Capability> {
        self.graph
            .get(name)
            .ok_or_else(|| AppError::config(format!("unknown capability '{}'", name)))
    }

    /// Tool definitions for one capability: owned tools, then transfers.
    fn tool_definitions(&self, capability: &Capability) -> AppResult<Vec<ToolDefinition>> {
        let mut definitions = Vec::new();
        for name in capability.tools() {
            let tool = self
                .tools
                .get(name)
                .ok_or_else(|| AppError::internal(format!("tool '{}' disappeared", name)))?;
            definitions.push(ToolDefinition::from_schema_value(
                tool.name(),
                tool.description(),
                tool.parameters_schema(),
            )?);
        }
        for target in capability.delegates() {
            let description = self
                .graph
                .get(target)
                .map(|c| c.description().to_string())
                .unwrap_or_default();
            definitions.push(ToolDefinition {
                name: transfer_tool_name(target),
                description: format!("Hand the conversation to {}: {}", target, description),
                input_schema: ParameterSchema::object(None, HashMap::new(), Vec::new()),
            });
        }
        Ok(definitions)
    }

    fn request_options(capability: &Capability) -> LlmRequestOptions {
        LlmRequestOptions {
            response_format: capability.output().cloned(),
            ..Default::default()
        }
    }

    async fn call_provider(
        &self,
        capability: &Capability,
        transcript: &[Message],
        echo: Option<&mpsc::Sender<UnifiedStreamEvent>>,
    ) -> AppResult<LlmResponse> {
        let tools = self.tool_definitions(capability)?;
        let system = Some(capability.instructions().to_string()).filter(|s| !s.is_empty());
        let options = Self::request_options(capability);
        let response = match echo {
            Some(tx) => {
                self.provider
                    .stream_message(transcript.to_vec(), system, tools, tx.clone(), options)
                    .await?
            }
            None => {
                self.provider
                    .send_message(transcript.to_vec(), system, tools, options)
                    .await?
            }
        };
        Ok(response)
    }

    /// Run the tool calls of one turn. Returns the accepted transfer target, if any.
    async fn run_tool_calls(
        &self,
        capability: &Capability,
        calls: &[ToolCall],
        transcript: &mut Vec<Message>,
        echo: Option<&mpsc::Sender<UnifiedStreamEvent>>,
    ) -> Option<String> {
        let mut transfer: Option<String> = None;
        for call in calls {
            if let Some(target) = call.name.strip_prefix(TRANSFER_PREFIX) {
                let accepted = transfer.is_none() && capability.can_delegate_to(target);
                let (text, is_error) = if accepted {
                    transfer = Some(target.to_string());
                    (format!("Transferred to {}.", target), false)
                } else {
                    (
                        format!("{} cannot transfer to {} now.", capability.name(), target),
                        true,
                    )
                };
                transcript.push(Message::tool_result(&call.id, text, is_error));
                continue;
            }

            if !capability.tools().iter().any(|t| t == &call.name) {
                tracing::warn!(
                    "[AgentRouter] {} called unknown tool {}",
                    capability.name(),
                    call.name
                );
                transcript.push(Message::tool_result(
                    &call.id,
                    format!("Unknown tool: {}", call.name),
                    true,
                ));
                continue;
            }

            let ctx = ToolContext::new(
                self.session_id.as_str(),
                self.data_root.as_path(),
                capability.name(),
                call.id.as_str(),
            );
            let (text, is_error) = match self.tools.execute(&call.name, &ctx, call.arguments.clone()).await {
                Ok(Value::String(text)) => (text, false),
                Ok(other) => (other.to_string(), false),
                Err(e) => (e.to_string(), true),
            };
            tracing::debug!(
                "[AgentRouter] {} -> {} returned {} chars",
                capability.name(),
                call.name,
                text.len()
            );
            if let Some(tx) = echo {
                let (result, error) = if is_error {
                    (None, Some(text.clone()))
                } else {
                    (Some(text.clone()), None)
                };
                let _ = tx
                    .send(UnifiedStreamEvent::ToolResult {
                        tool_id: call.id.clone(),
                        result,
                        error,
                    })
                    .await;
            }
            transcript.push(Message::tool_result(&call.id, text, is_error));
        }
        transfer
    }

    async fn run(
        &self,
        request: &RoutingRequest,
        echo: Option<&mpsc::Sender<UnifiedStreamEvent>>,
    ) -> AppResult<Option<RoutingOutcome>> {
        let mut current = self.capability(&request.entry_point)?;
        let mut transcript: Vec<Message> = request.messages.iter().map(to_message).collect();
        let mut chain = TransferChain::new();

        for turn in 1..=self.max_turns {
            tracing::debug!("[AgentRouter] turn {} on {}", turn, current.name());
            let response = self.call_provider(current, &transcript, echo).await?;

            if !response.has_tool_calls() {
                tracing::info!(
                    "[AgentRouter] finished on {} after {} turns ({})",
                    current.name(),
                    turn,
                    chain.summary()
                );
                let outcome = finish(current, &response);
                if let (Some(tx), Some(first)) = (echo, chain.entries().first()) {
                    let _ = tx
                        .send(UnifiedStreamEvent::AgentTransferEnd {
                            from_agent: current.name().to_string(),
                            to_agent: first.from.clone(),
                            success: outcome.is_some(),
                        })
                        .await;
                }
                return Ok(outcome);
            }

            transcript.push(Message::assistant_tool_calls(
                response.content.clone(),
                &response.tool_calls,
            ));
            if let Some(target) = self
                .run_tool_calls(current, &response.tool_calls, &mut transcript, echo)
                .await
            {
                let next = self.capability(&target)?;
                chain.record(current.name(), next.name(), turn);
                tracing::info!("[AgentRouter] transfer {} -> {}", current.name(), next.name());
                if let Some(tx) = echo {
                    let _ = tx
                        .send(UnifiedStreamEvent::AgentTransferStart {
                            from_agent: current.name().to_string(),
                            to_agent: next.name().to_string(),
                            depth: chain.depth(),
                        })
                        .await;
                }
                current = next;
            }
        }

        tracing::warn!(
            "[AgentRouter] gave up after {} turns ({})",
            self.max_turns,
            chain.summary()
        );
        Ok(None)
    }
}

fn to_message(entry: &ConversationEntry) -> Message {
    match entry.role {
        EntryRole::User => Message::user(entry.content.as_str()),
        EntryRole::System => Message::system(entry.content.as_str()),
    }
}

/// Final reply to outcome. Blank replies are no result; schema-bearing
/// capabilities yield JSON when the reply parses, raw text otherwise.
fn finish(capability: &Capability, response: &LlmResponse) -> Option<RoutingOutcome> {
    let text = response.trimmed_content()?;
    if capability.is_structured() {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return Some(RoutingOutcome::Structured(value));
        }
        tracing::warn!(
            "[AgentRouter] {} returned non-JSON output",
            capability.name()
        );
    }
    Some(RoutingOutcome::Text(text.to_string()))
}

#[async_trait]
impl RoutingBoundary for AgentRouter {
    async fn route(&self, request: RoutingRequest) -> AppResult<Option<RoutingOutcome>> {
        tracing::info!(
            "[AgentRouter] session={} entry={} messages={} echo={}",
            self.session_id,
            request.entry_point,
            request.messages.len(),
            request.echo
        );
        if !request.echo {
            return self.run(&request, None).await;
        }

        let (tx, renderer) = spawn_renderer(&self.echo_writer);
        let result = self.run(&request, Some(&tx)).await;
        drop(tx);
        if let Err(e) = renderer.await {
            tracing::warn!("[AgentRouter] renderer task failed: {}", e);
        }
        result
    }
}

// ============================================================================
// Tests
// ============================================================================
