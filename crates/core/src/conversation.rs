//! Conversation Log
//!
//! Ordered, append-only history shared by every pipeline phase and handed to
//! the routing boundary. Entries are never edited or reordered once written.

use serde::{Deserialize, Serialize};

/// Who an entry is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryRole {
    User,
    System,
}

impl EntryRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryRole::User => "user",
            EntryRole::System => "system",
        }
    }
}

/// One record in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: EntryRole,
    pub content: String,
}

impl ConversationEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: EntryRole::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: EntryRole::System,
            content: content.into(),
        }
    }
}

/// Append-only conversation log.
///
/// The only mutating operations are the `append_*` methods; readers get a
/// slice view.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationLog {
    entries: Vec<ConversationEntry>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    pub fn append_user(&mut self, content: impl Into<String>) {
        self.append(ConversationEntry::user(content));
    }

    pub fn append_system(&mut self, content: impl Into<String>) {
        self.append(ConversationEntry::system(content));
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
