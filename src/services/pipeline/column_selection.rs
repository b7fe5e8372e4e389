//! Column Selection
//!
//! Turns the operator's free-text column request into catalog columns. The
//! column-identification capability proposes names; anything outside the
//! catalog is dropped, keyword matching fills in when nothing survives, and
//! the operator confirms the result.

use siteline_core::ConversationEntry;
use siteline_tools::AccessColumn;

use crate::models::ColumnSelection;
use crate::services::operator::{is_cancel_keyword, Operator};
use crate::services::routing::capability::IDENTIFY_COLUMNS;
use crate::services::routing::{RoutingBoundary, RoutingRequest};
use crate::utils::error::{AppError, AppResult};

use super::{instructions, parse_structured};

pub const DEFAULT_MAX_COLUMN_ROUNDS: u32 = 5;

const CONFIRM_PROMPT: &str = "Extract these columns?";
const RETRY_PROMPT: &str =
    "Enter the data items again (e.g. date, visits, cv rate; blank or q to cancel)";

pub struct ColumnSelector<'a> {
    boundary: &'a dyn RoutingBoundary,
    operator: &'a dyn Operator,
    max_rounds: u32,
}

impl<'a> ColumnSelector<'a> {
    pub fn new(boundary: &'a dyn RoutingBoundary, operator: &'a dyn Operator) -> Self {
        Self {
            boundary,
            operator,
            max_rounds: DEFAULT_MAX_COLUMN_ROUNDS,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Returns the confirmed columns and the request text they came from.
    pub async fn select(&self, request: &str) -> AppResult<(Vec<AccessColumn>, String)> {
        let mut request = request.trim().to_string();

        for round in 1..=self.max_rounds {
            tracing::debug!("[ColumnSelector] round {}/{}: {}", round, self.max_rounds, request);
            let outcome = self
                .boundary
                .route(RoutingRequest::new(
                    IDENTIFY_COLUMNS,
                    vec![ConversationEntry::user(instructions::column_request(&request))],
                ))
                .await?;
            let selection: ColumnSelection = parse_structured(outcome, "column selection")?;

            let mut columns = catalog_columns(&selection.columns);
            if columns.is_empty() {
                columns = AccessColumn::match_keywords(&request);
                if !columns.is_empty() {
                    tracing::info!("[ColumnSelector] fell back to keyword matching");
                }
            }

            if columns.is_empty() {
                self.operator.say("No valid columns could be identified.");
                if !selection.reasoning.trim().is_empty() {
                    self.operator.say(selection.reasoning.trim());
                }
                self.operator.say("Only these columns are available:");
                for column in AccessColumn::ALL {
                    self.operator
                        .say(&format!("- {}: {}", column.name(), column.description()));
                }
            } else {
                let names: Vec<&str> = columns.iter().map(|c| c.name()).collect();
                self.operator
                    .say(&format!("Identified columns: {}", names.join(", ")));
                if self.operator.confirm(CONFIRM_PROMPT)? {
                    tracing::info!("[ColumnSelector] confirmed {:?}", names);
                    return Ok((columns, request));
                }
            }

            if round == self.max_rounds {
                break;
            }
            let retry = self.operator.prompt(RETRY_PROMPT)?;
            if is_cancel_keyword(&retry) {
                return Err(AppError::Cancelled);
            }
            request = retry.trim().to_string();
        }

        tracing::warn!("[ColumnSelector] no columns after {} rounds", self.max_rounds);
        Err(AppError::exhausted("column selection", self.max_rounds))
    }
}

/// Catalog columns among `names`, in reply order, without repeats.
fn catalog_columns(names: &[String]) -> Vec<AccessColumn> {
    let mut columns = Vec::new();
    for name in names {
        match AccessColumn::resolve(name) {
            Some(column) if !columns.contains(&column) => columns.push(column),
            Some(_) => {}
            None => tracing::debug!("[ColumnSelector] dropping unknown column {:?}", name),
        }
    }
    columns
}
