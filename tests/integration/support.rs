//! Fixtures and test doubles shared by the integration tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use siteline::services::operator::Operator;
use siteline::services::routing::{RoutingBoundary, RoutingOutcome, RoutingRequest};
use siteline::utils::error::{AppError, AppResult};
use siteline_core::UnifiedStreamEvent;
use siteline_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
    StopReason, ToolCall, ToolDefinition, UsageStats,
};
use siteline_tools::CsvTableSource;
use tempfile::TempDir;

pub const ACCESS_CSV: &str = "\
日付,ページタイトル,URL,訪問数,直帰率,平均滞在時間,CV数,CV率
2024-01-05,Top,/,120,35%,0:02:45,2,1.67%
2024-01-05,Pricing,/pricing,80,40%,0:01:10,4,5%
2024-01-20,Top,/,100,25%,0:03:05,3,3%
2024-02-02,Top,/,50,50%,0:01:00,0,0%
";

pub const SERVICE_CSV: &str = "\
site_id,service,overview
111,PC Rental,Monthly laptop rental for small offices
222,Cloud Backup,Managed backup for NAS devices
";

/// Temp directory holding both datasets under their default names.
pub fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), siteline_tools::source::DEFAULT_ACCESS_FILE, ACCESS_CSV);
    write(dir.path(), siteline_tools::source::DEFAULT_SERVICE_FILE, SERVICE_CSV);
    dir
}

pub fn write(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), body).unwrap();
}

pub fn csv_source(dir: &Path) -> Arc<CsvTableSource> {
    Arc::new(CsvTableSource::new(dir))
}

// ============================================================================
// Scripted routing boundary / operator
// ============================================================================

#[derive(Default)]
pub struct ScriptedBoundary {
    replies: Mutex<VecDeque<AppResult<Option<RoutingOutcome>>>>,
    requests: Mutex<Vec<RoutingRequest>>,
}

impl ScriptedBoundary {
    pub fn new(replies: Vec<AppResult<Option<RoutingOutcome>>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RoutingRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoutingBoundary for ScriptedBoundary {
    async fn route(&self, request: RoutingRequest) -> AppResult<Option<RoutingOutcome>> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::internal("script exhausted")))
    }
}

#[derive(Default)]
pub struct ScriptedOperator {
    answers: Mutex<VecDeque<String>>,
    confirms: Mutex<VecDeque<bool>>,
    said: Mutex<Vec<String>>,
}

impl ScriptedOperator {
    pub fn new(answers: &[&str], confirms: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|s| s.to_string()).collect()),
            confirms: Mutex::new(confirms.iter().copied().collect()),
            said: Mutex::new(Vec::new()),
        }
    }

    pub fn transcript(&self) -> String {
        self.said.lock().unwrap().join("\n")
    }
}

impl Operator for ScriptedOperator {
    fn say(&self, text: &str) {
        self.said.lock().unwrap().push(text.to_string());
    }

    fn prompt(&self, _question: &str) -> AppResult<String> {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::internal("no scripted answer"))
    }

    fn confirm(&self, _question: &str) -> AppResult<bool> {
        self.confirms
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::internal("no scripted confirmation"))
    }
}

pub fn structured(value: serde_json::Value) -> AppResult<Option<RoutingOutcome>> {
    Ok(Some(RoutingOutcome::Structured(value)))
}

pub fn text(text: &str) -> AppResult<Option<RoutingOutcome>> {
    Ok(Some(RoutingOutcome::Text(text.to_string())))
}

// ============================================================================
// Mock LLM provider
// ============================================================================

/// Replays canned responses and keeps every transcript it was sent.
pub struct MockLlmProvider {
    responses: Mutex<Vec<LlmResult<LlmResponse>>>,
    transcripts: Mutex<Vec<Vec<Message>>>,
    config: ProviderConfig,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<LlmResult<LlmResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            transcripts: Mutex::new(Vec::new()),
            config: ProviderConfig::default(),
        }
    }

    pub fn transcripts(&self) -> Vec<Vec<Message>> {
        self.transcripts.lock().unwrap().clone()
    }

    fn next(&self, messages: Vec<Message>) -> LlmResult<LlmResponse> {
        self.transcripts.lock().unwrap().push(messages);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(LlmError::Other {
                message: "No more mock responses available".to_string(),
            })
        } else {
            responses.remove(0)
        }
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        _system: Option<String>,
        _tools: Vec<ToolDefinition>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        self.next(messages)
    }

    async fn stream_message(
        &self,
        messages: Vec<Message>,
        _system: Option<String>,
        _tools: Vec<ToolDefinition>,
        tx: mpsc::Sender<UnifiedStreamEvent>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let response = self.next(messages)?;
        if let Some(content) = &response.content {
            let _ = tx
                .send(UnifiedStreamEvent::TextDelta {
                    content: content.clone(),
                })
                .await;
            let _ = tx.send(UnifiedStreamEvent::TextDone).await;
        }
        Ok(response)
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

pub fn reply(content: &str) -> LlmResult<LlmResponse> {
    Ok(LlmResponse {
        content: Some(content.to_string()),
        tool_calls: vec![],
        stop_reason: StopReason::EndTurn,
        usage: UsageStats::default(),
        model: "mock-model".to_string(),
    })
}

pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> LlmResult<LlmResponse> {
    Ok(LlmResponse {
        content: None,
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }],
        stop_reason: StopReason::ToolUse,
        usage: UsageStats::default(),
        model: "mock-model".to_string(),
    })
}

/// Text of the tool result answering `call_id`, if the transcript has one.
pub fn tool_result_text(transcript: &[Message], call_id: &str) -> Option<String> {
    transcript.iter().find_map(|m| {
        m.content.iter().find_map(|c| match c {
            siteline_llm::MessageContent::ToolResult {
                tool_use_id,
                content,
                ..
            } if tool_use_id == call_id => Some(content.clone()),
            _ => None,
        })
    })
}
