//! Capability Definitions
//!
//! A capability is one reasoning role in the graph: its instructions, the
//! tools it owns, the capabilities it may delegate to, and optionally a JSON
//! schema its final reply must follow.

use serde_json::Value;

use siteline_llm::ResponseFormat;

pub const TRIAGE: &str = "triage";
pub const QUERY_DATA: &str = "query_data";
pub const DATA_ANALYST: &str = "data_analyst";
pub const CONTENT: &str = "content";
pub const IDENTIFY_DATE: &str = "identify_date";
pub const IDENTIFY_COLUMNS: &str = "identify_columns";

/// Name prefix of the pseudo-tools that hand control to another capability.
pub const TRANSFER_PREFIX: &str = "transfer_to_";

#[derive(Debug, Clone, PartialEq)]
pub struct Capability {
    name: String,
    description: String,
    instructions: String,
    tools: Vec<String>,
    delegates: Vec<String>,
    output: Option<ResponseFormat>,
}

impl Capability {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            instructions: String::new(),
            tools: Vec::new(),
            delegates: Vec::new(),
            output: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Require the final reply to be a JSON object matching `schema`.
    pub fn with_output_schema(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.output = Some(ResponseFormat {
            name: name.into(),
            schema,
        });
        self
    }

    /// Added by the graph builder while wiring edges.
    pub(crate) fn add_delegate(&mut self, target: &str) {
        if !self.delegates.iter().any(|d| d == target) {
            self.delegates.push(target.to_string());
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn delegates(&self) -> &[String] {
        &self.delegates
    }

    pub fn can_delegate_to(&self, target: &str) -> bool {
        self.delegates.iter().any(|d| d == target)
    }

    pub fn output(&self) -> Option<&ResponseFormat> {
        self.output.as_ref()
    }

    pub fn is_structured(&self) -> bool {
        self.output.is_some()
    }
}

/// Pseudo-tool name for a delegation edge.
pub fn transfer_tool_name(target: &str) -> String {
    format!("{}{}", TRANSFER_PREFIX, target)
}
