//! Pipeline Integration Tests
//!
//! Whole sessions: once against a scripted routing boundary, once against
//! the real router, tools and CSV fixtures with a mock provider.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;

use siteline::models::SessionRecord;
use siteline::services::pipeline::{Phase, PhaseOrchestrator, SessionOutcome, SessionSummary};
use siteline::services::routing::{default_graph, default_tools, AgentRouter};
use siteline_core::EntryRole;

use crate::support::{
    csv_source, data_dir, reply, structured, text, tool_call, tool_result_text, MockLlmProvider,
    ScriptedBoundary, ScriptedOperator,
};

fn record() -> SessionRecord {
    SessionRecord::with_session_id(
        "0123456789abcdef",
        "111",
        NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
    )
}

fn completed(outcome: SessionOutcome) -> SessionSummary {
    match outcome {
        SessionOutcome::Completed(summary) => summary,
        other => panic!("expected a completed session, got {:?}", other),
    }
}

#[tokio::test]
async fn test_phase_outputs_flow_into_the_report_instruction() {
    let service_info = "PC Rental\nMonthly laptop rental for small offices";
    let access_data = "| page_title | visits |\n|:---|---:|\n| Top | 220 |";
    let boundary = Arc::new(ScriptedBoundary::new(vec![
        structured(json!({
            "is_date": true,
            "date_from": "2024-01-01",
            "date_to": "2024-01-31",
            "reasoning": "last month"
        })),
        text(service_info),
        structured(json!({"columns": ["page_title", "visits"], "reasoning": ""})),
        text(access_data),
        text("January traffic concentrated on the top page."),
    ]));
    let operator = Arc::new(ScriptedOperator::new(&["last month", "visits per page"], &[true, true]));

    let summary = completed(
        PhaseOrchestrator::new(boundary.clone(), operator.clone())
            .run(record())
            .await,
    );

    assert_eq!(summary.record.service_info(), service_info);
    assert_eq!(summary.record.access_data(), access_data);

    let requests = boundary.requests();
    let report = &requests[4];
    assert!(report.echo);
    assert!(report.messages[0].content.contains(service_info));
    assert!(report.messages[0].content.contains(access_data));

    let extraction = &requests[3].messages[0].content;
    assert!(extraction.contains("111"));
    assert!(extraction.contains("2024-01-01"));
    assert!(extraction.contains("page_title, visits"));
    assert!(extraction.contains("visits per page"));

    // topic, execution date, service info, period summary, report
    let log = summary.log.entries();
    assert_eq!(log[0].content, "last month");
    assert_eq!(log[1].role, EntryRole::System);
    assert_eq!(log[2].content, service_info);
    assert!(log[3].content.contains("2024-01-01 to 2024-01-31"));
    assert!(log[3].content.contains(access_data));
    assert!(log[4].content.contains("January traffic"));
}

#[tokio::test]
async fn test_every_phase_failing_still_completes() {
    let boundary = Arc::new(ScriptedBoundary::new(vec![
        structured(json!({"is_date": false, "reasoning": "which month?"})),
        structured(json!({"is_date": false, "reasoning": "still unclear"})),
        Ok(None),
    ]));
    let operator = Arc::new(ScriptedOperator::new(&["soon", "later"], &[]));

    let summary = completed(
        PhaseOrchestrator::new(boundary.clone(), operator.clone())
            .with_config(&siteline::models::AppConfig {
                max_date_rounds: 2,
                ..Default::default()
            })
            .run(record())
            .await,
    );

    let failed: Vec<Phase> = summary.failed.iter().map(|(p, _)| *p).collect();
    assert_eq!(failed, Phase::ALL.to_vec());
    assert!(summary.date_range.is_none());
    assert!(operator.transcript().contains("still unclear"));
}

#[tokio::test]
async fn test_full_stack_session() {
    let dir = data_dir();
    let provider = Arc::new(MockLlmProvider::new(vec![
        // phase 1: identify_date
        reply(r#"{"is_date": true, "date_from": "2024-01-01", "date_to": "2024-01-31", "reasoning": "last month"}"#),
        // phase 2: triage calls query_service
        tool_call("s1", "query_service", json!({"site_id": "111"})),
        reply("PC Rental: monthly laptop rental for small offices."),
        // phase 3: identify_columns, then triage -> query_data -> tool
        reply(r#"{"columns": ["page_title", "visits"], "reasoning": "visits per page"}"#),
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
        reply("| page_title | visits |\n|:---|---:|\n| Top | 220 |\n| Pricing | 80 |"),
        // phase 4: report
        reply("Top drives most January visits; Pricing converts best."),
    ]));
    let router = AgentRouter::new(
        provider.clone(),
        Arc::new(default_graph().unwrap()),
        Arc::new(default_tools(csv_source(dir.path()))),
    )
    .unwrap()
    .with_session("0123456789abcdef", dir.path())
    .with_echo_writer(Arc::new(|| Box::new(std::io::sink())));
    let operator = Arc::new(ScriptedOperator::new(&["last month", "visits per page"], &[true, true]));

    let summary = completed(
        PhaseOrchestrator::new(Arc::new(router), operator.clone())
            .run(record())
            .await,
    );

    assert!(summary.failed.is_empty(), "{:?}", summary.failed);
    assert_eq!(
        summary.record.service_info(),
        "PC Rental: monthly laptop rental for small offices."
    );
    assert!(summary.record.access_data().contains("| Top | 220 |"));
    assert_eq!(
        summary.record.report_result(),
        "Top drives most January visits; Pricing converts best."
    );

    let transcripts = provider.transcripts();
    assert_eq!(transcripts.len(), 8);
    let lookup = tool_result_text(&transcripts[2], "s1").unwrap();
    assert!(lookup.contains("Monthly laptop rental"));
    let table = tool_result_text(&transcripts[6], "q1").unwrap();
    assert!(table.lines().any(|l| l.contains("Top") && l.contains("220")));
}
