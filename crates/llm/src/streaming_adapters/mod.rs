//! Provider-Specific Stream Adapters

pub mod openai;

pub use openai::OpenAIAdapter;
