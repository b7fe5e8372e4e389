//! Siteline
//!
//! Conversational website reporting: resolves a period with the operator,
//! looks up the site's service description, extracts access metrics and
//! writes a report, delegating the language work to a capability graph
//! backed by an LLM provider.
//!
//! - `models` - configuration and session state
//! - `services` - routing, pipeline and console I/O
//! - `utils` - application error type

pub mod models;
pub mod services;
pub mod utils;

pub use models::{AppConfig, SessionRecord, SettingsUpdate};
pub use services::{AgentRouter, ConsoleOperator, PhaseOrchestrator, SessionOutcome};
pub use utils::error::{AppError, AppResult};
