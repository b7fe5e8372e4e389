//! OpenAI Chat Completions SSE Stream Adapter
//!
//! Converts `data: {...}` chunks into unified events. Tool call fragments
//! arrive keyed by `index`; the id and name only appear on the first fragment
//! of each call, arguments are spread over the rest.

use std::collections::BTreeMap;

use serde::Deserialize;
use siteline_core::streaming::{AdapterError, StreamAdapter, UnifiedStreamEvent};

#[derive(Debug, Deserialize)]
struct ChunkEvent {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallFragment>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallFragment {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionFragment>,
}

#[derive(Debug, Deserialize)]
struct FunctionFragment {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Default)]
struct PendingTool {
    id: String,
    name: String,
    arguments: String,
}

/// Adapter for the OpenAI chat-completions SSE format
pub struct OpenAIAdapter {
    model: String,
    /// Calls being accumulated, keyed by stream index
    pending: BTreeMap<usize, PendingTool>,
    /// Whether text was emitted since the last `TextDone`
    text_open: bool,
}

impl OpenAIAdapter {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            pending: BTreeMap::new(),
            text_open: false,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn flush(&mut self, events: &mut Vec<UnifiedStreamEvent>) {
        if self.text_open {
            self.text_open = false;
            events.push(UnifiedStreamEvent::TextDone);
        }
        for (_, tool) in std::mem::take(&mut self.pending) {
            events.push(UnifiedStreamEvent::ToolComplete {
                tool_id: tool.id,
                tool_name: tool.name,
                arguments: tool.arguments,
            });
        }
    }
}

impl StreamAdapter for OpenAIAdapter {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<UnifiedStreamEvent>, AdapterError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.starts_with(':') {
            return Ok(vec![]);
        }

        let json_str = match trimmed.strip_prefix("data:") {
            Some(rest) => rest.trim_start(),
            None if trimmed.starts_with('{') => trimmed,
            None => {
                return Err(AdapterError::InvalidFormat(format!(
                    "unexpected SSE line: {}",
                    trimmed
                )))
            }
        };

        let mut events = vec![];
        if json_str == "[DONE]" {
            self.flush(&mut events);
            return Ok(events);
        }

        let chunk: ChunkEvent =
            serde_json::from_str(json_str).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        for choice in chunk.choices {
            if let Some(delta) = choice.delta {
                if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
                    self.text_open = true;
                    events.push(UnifiedStreamEvent::TextDelta { content });
                }

                for fragment in delta.tool_calls.unwrap_or_default() {
                    let entry = self.pending.entry(fragment.index).or_default();
                    if let Some(id) = fragment.id.filter(|id| !id.is_empty()) {
                        entry.id = id;
                    }
                    if let Some(func) = fragment.function {
                        if let Some(name) = func.name.filter(|n| !n.is_empty()) {
                            if entry.name.is_empty() {
                                events.push(UnifiedStreamEvent::ToolStart {
                                    tool_id: entry.id.clone(),
                                    tool_name: name.clone(),
                                });
                            }
                            entry.name = name;
                        }
                        if let Some(args) = func.arguments {
                            entry.arguments.push_str(&args);
                        }
                    }
                }
            }

            if let Some(reason) = choice.finish_reason {
                self.flush(&mut events);
                events.push(UnifiedStreamEvent::Complete {
                    stop_reason: Some(reason),
                });
            }
        }

        // Usage arrives on a trailing chunk with an empty choices array.
        if let Some(usage) = chunk.usage {
            events.push(UnifiedStreamEvent::Usage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            });
        }

        Ok(events)
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.text_open = false;
    }
}
