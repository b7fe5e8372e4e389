//! Services
//!
//! Application logic between the binary and the workspace crates.
//!
//! - `routing` - capability graph and the LLM-backed router
//! - `pipeline` - the four-phase reporting session
//! - `operator` - console interaction
//! - `stream_render` - echo of streamed model output

pub mod operator;
pub mod pipeline;
pub mod routing;
pub mod stream_render;

pub use operator::{ConsoleOperator, Operator};
pub use pipeline::{PhaseOrchestrator, SessionOutcome};
pub use routing::{AgentRouter, RoutingBoundary, RoutingOutcome, RoutingRequest};
