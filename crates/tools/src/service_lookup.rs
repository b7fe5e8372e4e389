//! Service Lookup Tool
//!
//! `query_service`: returns the service name and overview registered for a
//! site identifier.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use siteline_core::{CoreResult, ExecutionContext, ToolContext, ToolDefinitionTrait, ToolExecutable};
use siteline_llm::ParameterSchema;

use crate::error::{ToolError, ToolResult, NO_MATCHING_SITE};
use crate::markdown::render_markdown;
use crate::query::{Predicate, Query};
use crate::source::{DatasetName, TabularSource, SERVICE_KEY, SERVICE_NAME, SERVICE_OVERVIEW};
use crate::table::Cell;

pub const TOOL_NAME: &str = "query_service";

#[derive(Debug, Deserialize)]
struct ServiceLookupArgs {
    #[serde(default)]
    site_id: String,
}

pub struct ServiceLookupTool {
    source: Arc<dyn TabularSource>,
}

impl ServiceLookupTool {
    pub fn new(source: Arc<dyn TabularSource>) -> Self {
        Self { source }
    }

    pub fn run(&self, site_id: &str) -> ToolResult<String> {
        let site_id = site_id.trim();
        if site_id.is_empty() {
            return Err(ToolError::MissingSiteIdentifier);
        }
        let table = self.source.load(DatasetName::Services)?;
        let result = Query::select([SERVICE_NAME, SERVICE_OVERVIEW])
            .filter(Predicate::Equals {
                column: SERVICE_KEY.to_string(),
                value: Cell::Text(site_id.to_string()),
            })
            .execute(&table)?;
        if result.is_empty() {
            return Ok(NO_MATCHING_SITE.to_string());
        }
        Ok(render_markdown(&result))
    }

    pub fn answer(&self, site_id: &str) -> String {
        self.run(site_id).unwrap_or_else(|e| {
            tracing::warn!("[{}] {}", TOOL_NAME, e);
            e.sentinel()
        })
    }
}

impl ToolDefinitionTrait for ServiceLookupTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Look up the service name and overview of a site by its site_id."
    }

    fn parameters_schema(&self) -> Value {
        let mut properties = HashMap::new();
        properties.insert(
            "site_id".to_string(),
            ParameterSchema::string(Some("Identifier of the site, e.g. \"111\"")),
        );
        let schema = ParameterSchema::object(
            Some("query_service parameters"),
            properties,
            vec!["site_id".to_string()],
        );
        serde_json::to_value(schema).unwrap_or_default()
    }
}

#[async_trait]
impl ToolExecutable for ServiceLookupTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> CoreResult<Value> {
        tracing::info!(
            "[{}] session={} capability={} call={}",
            TOOL_NAME,
            ctx.session_id(),
            ctx.capability(),
            ctx.tool_call_id()
        );
        let text = match serde_json::from_value::<ServiceLookupArgs>(args) {
            Ok(args) => self.answer(&args.site_id),
            Err(e) => ToolError::InvalidArguments(e.to_string()).sentinel(),
        };
        Ok(Value::String(text))
    }
}
