//! Phase Orchestrator
//!
//! Runs the four phases in order. Each phase has its own failure boundary:
//! validation-class failures are reported and the next phase runs; a
//! cancellation ends the session quietly; anything else aborts it.

use std::fmt;
use std::sync::Arc;

use siteline_core::{ConversationEntry, ConversationLog};
use siteline_tools::AccessColumn;

use crate::models::{AppConfig, DateRange, SessionRecord, Slot};
use crate::services::operator::{is_cancel_keyword, Operator};
use crate::services::routing::capability::TRIAGE;
use crate::services::routing::{RoutingBoundary, RoutingRequest};
use crate::utils::error::{AppError, AppResult};

use super::column_selection::{ColumnSelector, DEFAULT_MAX_COLUMN_ROUNDS};
use super::date_resolution::{DateResolver, DEFAULT_MAX_DATE_ROUNDS};
use super::instructions;

const TOPIC_PROMPT: &str =
    "Starting the website report. Which period should the report cover? (blank or q to quit)";
const COLUMN_PROMPT: &str = "Which data items do you want to analyse? (e.g. visits, cv rate)";
const APOLOGY: &str = "Sorry, something went wrong and the session had to stop. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    DateResolution,
    ServiceLookup,
    MetricExtraction,
    ReportSynthesis,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::DateResolution,
        Phase::ServiceLookup,
        Phase::MetricExtraction,
        Phase::ReportSynthesis,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::DateResolution => write!(f, "date resolution"),
            Phase::ServiceLookup => write!(f, "service lookup"),
            Phase::MetricExtraction => write!(f, "metric extraction"),
            Phase::ReportSynthesis => write!(f, "report synthesis"),
        }
    }
}

/// State left behind by a session, whatever its outcome.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub record: SessionRecord,
    pub log: ConversationLog,
    pub date_range: Option<DateRange>,
    /// Phases that failed recoverably, with the reason
    pub failed: Vec<(Phase, String)>,
}

#[derive(Debug)]
pub enum SessionOutcome {
    /// All phases ran; some may have failed recoverably
    Completed(SessionSummary),
    Cancelled(SessionSummary),
    Aborted { summary: SessionSummary, error: String },
}

impl SessionOutcome {
    pub fn summary(&self) -> &SessionSummary {
        match self {
            SessionOutcome::Completed(summary) | SessionOutcome::Cancelled(summary) => summary,
            SessionOutcome::Aborted { summary, .. } => summary,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, SessionOutcome::Aborted { .. })
    }
}

pub struct PhaseOrchestrator {
    boundary: Arc<dyn RoutingBoundary>,
    operator: Arc<dyn Operator>,
    max_date_rounds: u32,
    max_column_rounds: u32,
}

impl PhaseOrchestrator {
    pub fn new(boundary: Arc<dyn RoutingBoundary>, operator: Arc<dyn Operator>) -> Self {
        Self {
            boundary,
            operator,
            max_date_rounds: DEFAULT_MAX_DATE_ROUNDS,
            max_column_rounds: DEFAULT_MAX_COLUMN_ROUNDS,
        }
    }

    /// Take round budgets from configuration.
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.max_date_rounds = config.max_date_rounds;
        self.max_column_rounds = config.max_column_rounds;
        self
    }

    /// Run one session. Asks the operator for the opening topic first.
    pub async fn run(&self, record: SessionRecord) -> SessionOutcome {
        let mut session = SessionSummary {
            record,
            log: ConversationLog::new(),
            date_range: None,
            failed: Vec::new(),
        };
        tracing::info!(
            "[Orchestrator] session {} for site {} on {}",
            session.record.session_id(),
            session.record.site_identifier(),
            session.record.execution_date()
        );

        let topic = match self.operator.prompt(TOPIC_PROMPT) {
            Ok(topic) if is_cancel_keyword(&topic) => {
                self.operator.say("Session cancelled.");
                return SessionOutcome::Cancelled(session);
            }
            Ok(topic) => topic,
            Err(e) => return self.abort(session, e),
        };
        session.log.append_user(topic.trim());

        for phase in Phase::ALL {
            let result = match phase {
                Phase::DateResolution => self.resolve_dates(&mut session).await,
                Phase::ServiceLookup => self.lookup_service(&mut session).await,
                Phase::MetricExtraction => self.extract_metrics(&mut session).await,
                Phase::ReportSynthesis => self.synthesize_report(&mut session).await,
            };
            match result {
                Ok(()) => tracing::info!("[Orchestrator] {} done", phase),
                Err(AppError::Cancelled) => {
                    tracing::info!("[Orchestrator] cancelled during {}", phase);
                    self.operator.say("Session cancelled.");
                    return SessionOutcome::Cancelled(session);
                }
                Err(e) if e.is_phase_recoverable() => {
                    tracing::warn!("[Orchestrator] {} failed: {}", phase, e);
                    self.operator
                        .say(&format!("> System: {} failed: {}", phase, e));
                    session.failed.push((phase, e.to_string()));
                }
                Err(e) => return self.abort(session, e),
            }
        }

        SessionOutcome::Completed(session)
    }

    fn abort(&self, session: SessionSummary, error: AppError) -> SessionOutcome {
        tracing::error!(
            "[Orchestrator] session {} aborted: {}",
            session.record.session_id(),
            error
        );
        self.operator.say(APOLOGY);
        SessionOutcome::Aborted {
            summary: session,
            error: error.to_string(),
        }
    }

    async fn route_triage(&self, instruction: String, echo: bool) -> AppResult<String> {
        let mut request = RoutingRequest::new(TRIAGE, vec![ConversationEntry::user(instruction)]);
        if echo {
            request = request.echoed();
        }
        self.boundary
            .route(request)
            .await?
            .map(|outcome| outcome.into_text())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AppError::no_response("triage returned no result"))
    }

    // ========================================================================
    // Phases
    // ========================================================================

    async fn resolve_dates(&self, session: &mut SessionSummary) -> AppResult<()> {
        let candidate = DateResolver::new(self.boundary.as_ref(), self.operator.as_ref())
            .with_max_rounds(self.max_date_rounds)
            .resolve(&mut session.log, session.record.execution_date())
            .await?;
        let range = candidate.range()?;
        self.operator
            .say(&format!("Analysis period set to {}.", range));
        session.date_range = Some(range);
        Ok(())
    }

    async fn lookup_service(&self, session: &mut SessionSummary) -> AppResult<()> {
        let instruction = instructions::service_lookup(session.record.site_identifier());
        let service_info = self.route_triage(instruction, false).await?;
        session.log.append_user(service_info.as_str());
        session.record.write(Slot::ServiceInfo, service_info)
    }

    async fn extract_metrics(&self, session: &mut SessionSummary) -> AppResult<()> {
        let range = session
            .date_range
            .ok_or_else(|| AppError::validation("no analysis period; skipping data extraction"))?;

        self.operator.say("=== Available columns ===");
        for column in AccessColumn::ALL {
            self.operator
                .say(&format!("- {}: {}", column.name(), column.description()));
        }
        let request = self.operator.prompt(COLUMN_PROMPT)?;
        if request.trim().is_empty() {
            return Err(AppError::validation("no data items were entered"));
        }

        let (columns, request) = ColumnSelector::new(self.boundary.as_ref(), self.operator.as_ref())
            .with_max_rounds(self.max_column_rounds)
            .select(&request)
            .await?;

        let instruction = instructions::metric_extraction(
            session.record.site_identifier(),
            &range,
            &columns,
            &request,
        );
        let access_data = self.route_triage(instruction, false).await?;
        session
            .log
            .append_user(instructions::period_summary(&range, &access_data));
        session.record.write(Slot::AccessData, access_data)
    }

    async fn synthesize_report(&self, session: &mut SessionSummary) -> AppResult<()> {
        let range = session
            .date_range
            .ok_or_else(|| AppError::validation("no analysis period; skipping the report"))?;
        if session.record.service_info().trim().is_empty()
            || session.record.access_data().trim().is_empty()
        {
            return Err(AppError::validation(
                "service information or access data is missing",
            ));
        }

        let instruction = instructions::report(
            session.record.service_info(),
            session.record.access_data(),
            &range,
        );
        self.operator.say("\n=== Report ===");
        let report = self.route_triage(instruction, true).await?;
        self.operator.say("========================");
        session.log.append_user(instructions::generated_report(&report));
        session.record.write(Slot::ReportResult, report)
    }
}
