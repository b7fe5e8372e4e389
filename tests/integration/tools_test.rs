//! Query Tool Integration Tests
//!
//! The two query tools over CSV fixtures, called directly and through the
//! tool registry the router uses.

use serde_json::json;

use siteline::services::routing::default_tools;
use siteline_core::ToolContext;
use siteline_tools::error::{NO_MATCHING_DATA, NO_MATCHING_SITE};
use siteline_tools::{MetricQueryArgs, MetricQueryTool, ServiceLookupTool};
use tempfile::TempDir;

use crate::support::{csv_source, data_dir, write};

fn args(from: &str, to: &str, columns: &[&str]) -> MetricQueryArgs {
    MetricQueryArgs {
        date_from: from.to_string(),
        date_to: to.to_string(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        groupby_columns: None,
    }
}

// ============================================================================
// Metric extraction
// ============================================================================

#[test]
fn test_metric_query_over_japanese_headers() {
    let dir = data_dir();
    let tool = MetricQueryTool::new(csv_source(dir.path()));

    let out = tool.answer(&args("2024-01-01", "2024-01-31", &["日付", "page_title", "visits"]));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 5, "header, separator and three January rows:\n{}", out);
    assert!(lines[0].contains("date") && lines[0].contains("visits"));
    assert!(out.contains("Pricing"));
    assert!(!out.contains("2024-02-02"));
}

#[test]
fn test_metric_query_grouped_by_page() {
    let dir = data_dir();
    let tool = MetricQueryTool::new(csv_source(dir.path()));

    let mut grouped = args("2024-01-01", "2024-02-29", &["page_title", "visits"]);
    grouped.groupby_columns = Some(vec!["page_title".to_string()]);
    let out = tool.answer(&grouped);

    let top = out.lines().find(|l| l.contains("Top")).unwrap();
    assert!(top.contains("270"), "visits are summed per page: {}", top);
}

#[test]
fn test_metric_query_validation_sentinels() {
    let dir = data_dir();
    let tool = MetricQueryTool::new(csv_source(dir.path()));

    let bad_date = tool.answer(&args("2024/13/40", "2024-01-31", &["visits"]));
    assert!(bad_date.starts_with("invalid input:"), "{}", bad_date);

    let no_columns = tool.answer(&args("2024-01-01", "2024-01-31", &[]));
    assert!(no_columns.starts_with("invalid input:"), "{}", no_columns);

    let outside = tool.answer(&args("2023-01-01", "2023-01-31", &["visits"]));
    assert_eq!(outside, NO_MATCHING_DATA);
}

#[test]
fn test_metric_query_missing_file() {
    let dir = TempDir::new().unwrap();
    let tool = MetricQueryTool::new(csv_source(dir.path()));
    let out = tool.answer(&args("2024-01-01", "2024-01-31", &["visits"]));
    assert_eq!(out, "data file not found: landingpage_data.csv");
}

#[test]
fn test_metric_query_out_of_range_duration() {
    let dir = data_dir();
    write(
        dir.path(),
        siteline_tools::source::DEFAULT_ACCESS_FILE,
        "date,page_title,url,visits,bounce_rate,avg_session_duration,conversions,conversion_rate\n\
         2024-01-09,Top,/,7,10%,2000000:00:00,0,0%\n",
    );
    let tool = MetricQueryTool::new(csv_source(dir.path()));

    let out = tool.answer(&args("2024-01-01", "2024-01-31", &["visits"]));
    assert!(out.starts_with("unexpected error:"), "{}", out);
    assert!(out.contains("2000000:00:00"), "{}", out);
}

#[test]
fn test_metric_query_rereads_file_each_call() {
    let dir = data_dir();
    let tool = MetricQueryTool::new(csv_source(dir.path()));
    let january = args("2024-01-01", "2024-01-31", &["visits"]);
    assert_eq!(tool.answer(&january).lines().count(), 5);

    write(
        dir.path(),
        siteline_tools::source::DEFAULT_ACCESS_FILE,
        "date,page_title,url,visits,bounce_rate,avg_session_duration,conversions,conversion_rate\n\
         2024-01-09,Top,/,7,10%,0:00:30,0,0%\n",
    );
    let out = tool.answer(&january);
    assert_eq!(out.lines().count(), 3);
    assert!(out.contains('7'));
}

// ============================================================================
// Service lookup
// ============================================================================

#[test]
fn test_service_lookup() {
    let dir = data_dir();
    let tool = ServiceLookupTool::new(csv_source(dir.path()));

    let out = tool.answer("111");
    assert!(out.contains("PC Rental"));
    assert!(out.contains("Monthly laptop rental"));
    assert!(!out.contains("Cloud Backup"));

    assert_eq!(tool.answer("111"), out, "same input and data give the same answer");
    assert_eq!(tool.answer("999"), NO_MATCHING_SITE);
    assert!(tool.answer("  ").starts_with("invalid input:"));
}

// ============================================================================
// Through the registry
// ============================================================================

#[tokio::test]
async fn test_registry_executes_both_tools() {
    let dir = data_dir();
    let registry = default_tools(csv_source(dir.path()));
    assert_eq!(registry.len(), 2);

    let ctx = ToolContext::new("sess", dir.path(), "query_data", "call_1");
    let out = registry
        .execute(
            "query_data",
            &ctx,
            json!({"date_from": "2024-01-01", "date_to": "2024-01-31", "columns": ["visits"]}),
        )
        .await
        .unwrap();
    assert!(out.as_str().unwrap().contains("120"));

    let ctx = ctx.for_call("triage", "call_2");
    let out = registry
        .execute("query_service", &ctx, json!({"site_id": "222"}))
        .await
        .unwrap();
    assert!(out.as_str().unwrap().contains("Cloud Backup"));
}

#[tokio::test]
async fn test_malformed_arguments_become_sentinel() {
    let dir = data_dir();
    let registry = default_tools(csv_source(dir.path()));
    let ctx = ToolContext::new("sess", dir.path(), "query_data", "call_1");

    let out = registry
        .execute("query_data", &ctx, json!({"columns": "visits"}))
        .await
        .unwrap();
    assert!(out.as_str().unwrap().starts_with("invalid input: malformed arguments"));
}
