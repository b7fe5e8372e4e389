//! Siteline LLM
//!
//! Provider abstraction used by the capability router, plus the one concrete
//! provider Siteline ships: an OpenAI-compatible chat-completions client with
//! tool calling, JSON-schema structured output and SSE streaming.

pub mod http_client;
pub mod openai;
pub mod provider;
pub mod streaming_adapters;
pub mod types;

// Re-export main types
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;

pub use streaming_adapters::OpenAIAdapter;
