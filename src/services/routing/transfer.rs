//! Transfer Chain
//!
//! Records the hand-offs taken during one routing call, for logging and for
//! the depth reported in transfer events.

use serde::{Deserialize, Serialize};

/// A single hand-off between capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEntry {
    pub from: String,
    pub to: String,
    /// Model turn on which the transfer happened (1-based).
    pub turn: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferChain {
    entries: Vec<TransferEntry>,
}

impl TransferChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, from: &str, to: &str, turn: u32) {
        self.entries.push(TransferEntry {
            from: from.to_string(),
            to: to.to_string(),
            turn,
        });
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[TransferEntry] {
        &self.entries
    }

    /// Capability currently holding control, if any transfer happened.
    pub fn current(&self) -> Option<&str> {
        self.entries.last().map(|e| e.to.as_str())
    }

    /// `triage -> query_data -> data_analyst`
    pub fn summary(&self) -> String {
        let Some(first) = self.entries.first() else {
            return "(no transfers)".to_string();
        };
        std::iter::once(first.from.as_str())
            .chain(self.entries.iter().map(|e| e.to.as_str()))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain() {
        let chain = TransferChain::new();
        assert_eq!(chain.depth(), 0);
        assert!(chain.current().is_none());
        assert_eq!(chain.summary(), "(no transfers)");
    }

    #[test]
    fn test_summary_lists_each_capability_once() {
        let mut chain = TransferChain::new();
        chain.record("triage", "query_data", 1);
        chain.record("query_data", "data_analyst", 3);

        assert_eq!(chain.depth(), 2);
        assert_eq!(chain.current(), Some("data_analyst"));
        assert_eq!(chain.summary(), "triage -> query_data -> data_analyst");
        assert_eq!(chain.entries()[1].turn, 3);
    }
}
