//! Metric Query Tool
//!
//! `query_data`: projects catalog columns of the access dataset over a closed
//! date interval, optionally grouped, and renders the result as a table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use siteline_core::{CoreResult, ExecutionContext, ToolContext, ToolDefinitionTrait, ToolExecutable};
use siteline_llm::ParameterSchema;

use crate::catalog::AccessColumn;
use crate::error::{ToolError, ToolResult, NO_MATCHING_DATA};
use crate::markdown::render_markdown;
use crate::query::{Predicate, Query};
use crate::source::{DatasetName, TabularSource};
use crate::table::Cell;

pub const TOOL_NAME: &str = "query_data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricQueryArgs {
    pub date_from: String,
    pub date_to: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groupby_columns: Option<Vec<String>>,
}

pub struct MetricQueryTool {
    source: Arc<dyn TabularSource>,
}

impl MetricQueryTool {
    pub fn new(source: Arc<dyn TabularSource>) -> Self {
        Self { source }
    }

    /// Validate, query and render. Errors keep their type for the caller.
    pub fn run(&self, args: &MetricQueryArgs) -> ToolResult<String> {
        let from = parse_date("date_from", &args.date_from)?;
        let to = parse_date("date_to", &args.date_to)?;
        if args.columns.is_empty() {
            return Err(ToolError::MissingColumns);
        }
        let columns = resolve_all(&args.columns)?;
        let groupby = resolve_all(args.groupby_columns.as_deref().unwrap_or_default())?;

        let table = self.source.load(DatasetName::AccessMetrics)?;
        let result = Query::select(columns.iter().map(|c| c.name()))
            .filter(Predicate::Between {
                column: AccessColumn::Date.name().to_string(),
                from: Cell::Date(from),
                to: Cell::Date(to),
            })
            .group_by(groupby.iter().map(|c| c.name()))
            .execute(&table)?;

        if result.is_empty() {
            return Ok(NO_MATCHING_DATA.to_string());
        }
        Ok(render_markdown(&result))
    }

    /// Like `run`, with failures turned into sentinel text.
    pub fn answer(&self, args: &MetricQueryArgs) -> String {
        self.run(args).unwrap_or_else(|e| {
            tracing::warn!("[{}] {}", TOOL_NAME, e);
            e.sentinel()
        })
    }
}

fn parse_date(field: &'static str, value: &str) -> ToolResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ToolError::InvalidDateFormat {
        field,
        value: value.to_string(),
    })
}

fn resolve_all(names: &[String]) -> ToolResult<Vec<AccessColumn>> {
    names
        .iter()
        .map(|n| AccessColumn::resolve(n).ok_or_else(|| ToolError::UnknownColumn(n.clone())))
        .collect()
}

impl ToolDefinitionTrait for MetricQueryTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Fetch access metrics for a date range. Returns a markdown table of the requested \
         columns for rows whose date lies between date_from and date_to (inclusive), \
         optionally grouped by groupby_columns."
    }

    fn parameters_schema(&self) -> Value {
        let names: Vec<String> = AccessColumn::ALL.iter().map(|c| c.name().to_string()).collect();
        let mut properties = HashMap::new();
        properties.insert(
            "date_from".to_string(),
            ParameterSchema::string(Some("First day of the range, YYYY-MM-DD")),
        );
        properties.insert(
            "date_to".to_string(),
            ParameterSchema::string(Some("Last day of the range, YYYY-MM-DD")),
        );
        properties.insert(
            "columns".to_string(),
            ParameterSchema::array(
                Some("Columns to return, in order"),
                ParameterSchema::string(None).with_enum(names.clone()),
            ),
        );
        properties.insert(
            "groupby_columns".to_string(),
            ParameterSchema::array(
                Some("Columns to group by; omit for one row per record"),
                ParameterSchema::string(None).with_enum(names),
            ),
        );
        let schema = ParameterSchema::object(
            Some("query_data parameters"),
            properties,
            vec!["date_from".to_string(), "date_to".to_string(), "columns".to_string()],
        );
        serde_json::to_value(schema).unwrap_or_default()
    }
}

#[async_trait]
impl ToolExecutable for MetricQueryTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> CoreResult<Value> {
        tracing::info!(
            "[{}] session={} capability={} call={}",
            TOOL_NAME,
            ctx.session_id(),
            ctx.capability(),
            ctx.tool_call_id()
        );
        let text = match serde_json::from_value::<MetricQueryArgs>(args) {
            Ok(args) => self.answer(&args),
            Err(e) => ToolError::InvalidArguments(e.to_string()).sentinel(),
        };
        Ok(Value::String(text))
    }
}
