//! Data Models
//!
//! Configuration and per-run session structures.

pub mod session;
pub mod settings;

pub use session::*;
pub use settings::*;
