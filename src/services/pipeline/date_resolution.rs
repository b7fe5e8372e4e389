//! Date Resolution
//!
//! Asks the date-identification capability for a candidate range, has the
//! operator confirm it, and feeds corrections back into the conversation
//! until a range is accepted, the operator cancels, or the round budget runs
//! out.

use chrono::NaiveDate;

use siteline_core::ConversationLog;

use crate::models::DateCandidate;
use crate::services::operator::{is_cancel_keyword, Operator};
use crate::services::routing::capability::IDENTIFY_DATE;
use crate::services::routing::{RoutingBoundary, RoutingRequest};
use crate::utils::error::{AppError, AppResult};

use super::{instructions, parse_structured};

pub const DEFAULT_MAX_DATE_ROUNDS: u32 = 5;

const CONFIRM_PROMPT: &str = "Use this period?";
const CORRECTION_PROMPT: &str =
    "Enter the analysis period again (e.g. 2025-02-01 to 2025-02-28; blank or q to cancel)";

pub struct DateResolver<'a> {
    boundary: &'a dyn RoutingBoundary,
    operator: &'a dyn Operator,
    max_rounds: u32,
}

impl<'a> DateResolver<'a> {
    pub fn new(boundary: &'a dyn RoutingBoundary, operator: &'a dyn Operator) -> Self {
        Self {
            boundary,
            operator,
            max_rounds: DEFAULT_MAX_DATE_ROUNDS,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Run the loop. The returned candidate is exactly what the operator confirmed.
    pub async fn resolve(
        &self,
        log: &mut ConversationLog,
        execution_date: NaiveDate,
    ) -> AppResult<DateCandidate> {
        for round in 1..=self.max_rounds {
            tracing::debug!("[DateResolver] round {}/{}", round, self.max_rounds);
            log.append_system(instructions::execution_date(execution_date));

            let outcome = self
                .boundary
                .route(RoutingRequest::new(IDENTIFY_DATE, log.entries().to_vec()))
                .await?;
            let candidate: DateCandidate = parse_structured(outcome, "date candidate")?;

            if candidate.is_resolved() {
                self.operator.say(&format!(
                    "Proposed period: {} to {}",
                    candidate.date_from.trim(),
                    candidate.date_to.trim()
                ));
                if self.operator.confirm(CONFIRM_PROMPT)? {
                    tracing::info!(
                        "[DateResolver] confirmed {} to {} in round {}",
                        candidate.date_from,
                        candidate.date_to,
                        round
                    );
                    return Ok(candidate);
                }
            }

            self.operator.say("Could not settle the analysis period.");
            if !candidate.reasoning.trim().is_empty() {
                self.operator.say(candidate.reasoning.trim());
            }
            if round == self.max_rounds {
                break;
            }

            let correction = self.operator.prompt(CORRECTION_PROMPT)?;
            if is_cancel_keyword(&correction) {
                tracing::info!("[DateResolver] cancelled by operator in round {}", round);
                return Err(AppError::Cancelled);
            }
            log.append_user(correction.trim());
        }

        tracing::warn!("[DateResolver] no period after {} rounds", self.max_rounds);
        Err(AppError::exhausted("date resolution", self.max_rounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use siteline_core::EntryRole;

    use crate::services::pipeline::testing::{structured, text, ScriptedBoundary, ScriptedOperator};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
    }

    fn january() -> serde_json::Value {
        json!({
            "is_date": true,
            "date_from": "2024-01-01",
            "date_to": "2024-01-31",
            "reasoning": "last month"
        })
    }

    #[tokio::test]
    async fn test_confirmed_in_one_round() {
        let boundary = ScriptedBoundary::new(vec![structured(january())]);
        let operator = ScriptedOperator::new(&[], &[true]);
        let mut log = ConversationLog::new();
        log.append_user("last month please");

        let candidate = DateResolver::new(&boundary, &operator)
            .resolve(&mut log, today())
            .await
            .unwrap();

        assert_eq!(
            candidate,
            DateCandidate {
                is_date: true,
                date_from: "2024-01-01".to_string(),
                date_to: "2024-01-31".to_string(),
                reasoning: "last month".to_string(),
            }
        );
        let requests = boundary.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].entry_point, IDENTIFY_DATE);
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[0].messages[1].role, EntryRole::System);
        assert!(requests[0].messages[1].content.contains("2024-02-15"));
    }

    #[tokio::test]
    async fn test_unresolved_candidate_asks_again() {
        let boundary = ScriptedBoundary::new(vec![
            structured(json!({"is_date": false, "reasoning": "ambiguous month"})),
            structured(january()),
        ]);
        let operator = ScriptedOperator::new(&["January 2024"], &[true]);
        let mut log = ConversationLog::new();

        DateResolver::new(&boundary, &operator)
            .resolve(&mut log, today())
            .await
            .unwrap();

        let requests = boundary.requests();
        assert_eq!(requests.len(), 2);
        let second = &requests[1].messages;
        assert!(second
            .iter()
            .any(|m| m.role == EntryRole::User && m.content == "January 2024"));
        assert!(operator.transcript().contains("ambiguous month"));
    }

    #[tokio::test]
    async fn test_rejection_solicits_correction() {
        let boundary = ScriptedBoundary::new(vec![
            structured(january()),
            structured(json!({
                "is_date": true,
                "date_from": "2023-12-01",
                "date_to": "2023-12-31",
                "reasoning": "December"
            })),
        ]);
        let operator = ScriptedOperator::new(&["December instead"], &[false, true]);
        let mut log = ConversationLog::new();

        let candidate = DateResolver::new(&boundary, &operator)
            .resolve(&mut log, today())
            .await
            .unwrap();
        assert_eq!(candidate.date_from, "2023-12-01");
    }

    #[tokio::test]
    async fn test_cancel_keyword() {
        let boundary = ScriptedBoundary::new(vec![structured(json!({"is_date": false}))]);
        let operator = ScriptedOperator::new(&["q"], &[]);
        let mut log = ConversationLog::new();

        let err = DateResolver::new(&boundary, &operator)
            .resolve(&mut log, today())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
    }

    #[tokio::test]
    async fn test_round_budget() {
        let unresolved = || structured(json!({"is_date": false, "reasoning": "?"}));
        let boundary = ScriptedBoundary::new(vec![unresolved(), unresolved()]);
        let operator = ScriptedOperator::new(&["again"], &[]);
        let mut log = ConversationLog::new();

        let err = DateResolver::new(&boundary, &operator)
            .with_max_rounds(2)
            .resolve(&mut log, today())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RetriesExhausted { rounds: 2, .. }));
        assert!(err.is_phase_recoverable());
        assert_eq!(boundary.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_no_result_and_garbage() {
        let boundary = ScriptedBoundary::new(vec![Ok(None)]);
        let operator = ScriptedOperator::default();
        let err = DateResolver::new(&boundary, &operator)
            .resolve(&mut ConversationLog::new(), today())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoResponse(_)));

        let boundary = ScriptedBoundary::new(vec![text("sometime in spring")]);
        let err = DateResolver::new(&boundary, &operator)
            .resolve(&mut ConversationLog::new(), today())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedCandidate(_)));
    }
}
