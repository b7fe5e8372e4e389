//! Router Integration Tests
//!
//! The agent router over the default capability graph and the real query
//! tools, with a mock provider standing in for the model.

use std::sync::Arc;

use serde_json::json;

use siteline::services::routing::{
    default_graph, default_tools, AgentRouter, RoutingBoundary, RoutingOutcome, RoutingRequest,
};
use siteline_core::ConversationEntry;

use crate::support::{csv_source, data_dir, reply, tool_call, tool_result_text, MockLlmProvider};

fn router(provider: Arc<MockLlmProvider>, dir: &std::path::Path) -> AgentRouter {
    AgentRouter::new(
        provider,
        Arc::new(default_graph().unwrap()),
        Arc::new(default_tools(csv_source(dir))),
    )
    .unwrap()
    .with_session("0123456789abcdef", dir)
    .with_echo_writer(Arc::new(|| Box::new(std::io::sink())))
}

fn ask(entry: &str, text: &str) -> RoutingRequest {
    RoutingRequest::new(entry, vec![ConversationEntry::user(text)])
}

#[tokio::test]
async fn test_triage_transfers_to_query_data_and_runs_the_tool() {
    let dir = data_dir();
    let provider = Arc::new(MockLlmProvider::new(vec![
        tool_call("t1", "transfer_to_query_data", json!({})),
        tool_call(
            "q1",
            "query_data",
            json!({
                "date_from": "2024-01-01",
                "date_to": "2024-01-31",
                "columns": ["page_title", "visits"],
                "groupby_columns": ["page_title"]
            }),
        ),
        reply("Top had 220 visits, Pricing 80."),
    ]));
    let router = router(provider.clone(), dir.path());

    let outcome = router
        .route(ask("triage", "Extract January visits per page"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        Some(RoutingOutcome::Text("Top had 220 visits, Pricing 80.".to_string()))
    );

    let transcripts = provider.transcripts();
    assert_eq!(transcripts.len(), 3);
    assert_eq!(
        tool_result_text(&transcripts[1], "t1").as_deref(),
        Some("Transferred to query_data.")
    );
    let table = tool_result_text(&transcripts[2], "q1").unwrap();
    let top = table.lines().find(|l| l.contains("Top")).unwrap();
    assert!(top.contains("220"), "{}", table);
}

#[tokio::test]
async fn test_triage_answers_service_lookup_itself() {
    let dir = data_dir();
    let provider = Arc::new(MockLlmProvider::new(vec![
        tool_call("s1", "query_service", json!({"site_id": "111"})),
        reply("PC Rental: monthly laptop rental for small offices."),
    ]));
    let router = router(provider.clone(), dir.path());

    let outcome = router.route(ask("triage", "site_id: 111")).await.unwrap();
    assert!(matches!(outcome, Some(RoutingOutcome::Text(ref t)) if t.starts_with("PC Rental")));

    let result = tool_result_text(&provider.transcripts()[1], "s1").unwrap();
    assert!(result.contains("Monthly laptop rental for small offices"));
}

#[tokio::test]
async fn test_tool_validation_failure_reaches_the_model_as_text() {
    let dir = data_dir();
    let provider = Arc::new(MockLlmProvider::new(vec![
        tool_call(
            "q1",
            "query_data",
            json!({"date_from": "2024/13/40", "date_to": "2024-01-31", "columns": ["visits"]}),
        ),
        reply("The date was invalid."),
    ]));
    let router = router(provider.clone(), dir.path());

    router.route(ask("query_data", "visits")).await.unwrap();
    let result = tool_result_text(&provider.transcripts()[1], "q1").unwrap();
    assert!(result.starts_with("invalid input:"), "{}", result);
}

#[tokio::test]
async fn test_identify_date_returns_structured_candidate() {
    let dir = data_dir();
    let provider = Arc::new(MockLlmProvider::new(vec![reply(
        r#"{"is_date": true, "date_from": "2024-01-01", "date_to": "2024-01-31", "reasoning": "last month"}"#,
    )]));
    let router = router(provider, dir.path());

    match router.route(ask("identify_date", "last month")).await.unwrap() {
        Some(RoutingOutcome::Structured(value)) => {
            assert_eq!(value["is_date"], true);
            assert_eq!(value["date_from"], "2024-01-01");
        }
        other => panic!("expected structured candidate, got {:?}", other),
    }
}
