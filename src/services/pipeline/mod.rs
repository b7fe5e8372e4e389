//! Reporting Pipeline
//!
//! The four-phase session: date resolution, service lookup, metric
//! extraction, report synthesis. Every phase talks to the routing boundary
//! and the operator through trait objects.
//!
//! - `date_resolution` - interactive date-range confirmation loop
//! - `column_selection` - free-text column request to catalog columns
//! - `instructions` - instruction texts sent to the routing boundary
//! - `orchestrator` - phase sequencing and failure boundaries

pub mod column_selection;
pub mod date_resolution;
pub mod instructions;
pub mod orchestrator;

use serde::de::DeserializeOwned;

use crate::services::routing::RoutingOutcome;
use crate::utils::error::{AppError, AppResult};

pub use column_selection::ColumnSelector;
pub use date_resolution::DateResolver;
pub use orchestrator::{Phase, PhaseOrchestrator, SessionOutcome, SessionSummary};

/// Read a structured reply. Text replies are parsed as JSON.
pub(crate) fn parse_structured<T: DeserializeOwned>(
    outcome: Option<RoutingOutcome>,
    what: &str,
) -> AppResult<T> {
    let outcome = outcome.ok_or_else(|| AppError::no_response(format!("no {} returned", what)))?;
    let parsed = match outcome {
        RoutingOutcome::Structured(value) => serde_json::from_value(value),
        RoutingOutcome::Text(text) => serde_json::from_str(strip_code_fence(&text)),
    };
    parsed.map_err(|e| AppError::malformed(format!("unreadable {}: {}", what, e)))
}

/// Models sometimes wrap JSON in a ```json fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

// ============================================================================
// Test doubles
// ============================================================================
