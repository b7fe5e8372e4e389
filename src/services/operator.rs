//! Operator I/O
//!
//! Line-based console interaction with the person running the session.
//! The pipeline only sees the `Operator` trait; `ConsoleOperator` backs it
//! with dialoguer prompts.

use dialoguer::{Confirm, Input};

use crate::utils::error::{AppError, AppResult};

/// Inputs that abandon a correction prompt.
const CANCEL_KEYWORDS: [&str; 3] = ["q", "quit", "cancel"];

/// Whether `input` asks to stop the current loop. Blank input counts.
pub fn is_cancel_keyword(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.is_empty()
        || CANCEL_KEYWORDS
            .iter()
            .any(|k| trimmed.eq_ignore_ascii_case(k))
}

/// Console collaborator. Calls block until the operator answers.
pub trait Operator: Send + Sync {
    /// Show a line of text.
    fn say(&self, text: &str);

    /// Ask for a free-text line. May be empty.
    fn prompt(&self, question: &str) -> AppResult<String>;

    /// Ask a yes/no question.
    fn confirm(&self, question: &str) -> AppResult<bool>;
}

#[derive(Debug, Default)]
pub struct ConsoleOperator;

impl ConsoleOperator {
    pub fn new() -> Self {
        Self
    }
}

impl Operator for ConsoleOperator {
    fn say(&self, text: &str) {
        println!("{}", text);
    }

    fn prompt(&self, question: &str) -> AppResult<String> {
        Input::<String>::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| AppError::internal(format!("console input failed: {}", e)))
    }

    fn confirm(&self, question: &str) -> AppResult<bool> {
        Confirm::new()
            .with_prompt(question)
            .default(true)
            .interact()
            .map_err(|e| AppError::internal(format!("console input failed: {}", e)))
    }
}
