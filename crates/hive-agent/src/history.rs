//! Bounded ring of an agent's recently committed intents.

use std::collections::VecDeque;

use hive_core::{Intent, MAX_HISTORY_LEN};

/// The last N final intents of one agent, oldest first.
///
/// Capacity is fixed at construction (at most [`MAX_HISTORY_LEN`]); recording
/// beyond it evicts the oldest entry.
#[derive(Clone, Debug)]
pub struct DecisionHistory {
    entries: VecDeque<Intent>,
    capacity: usize,
}

impl DecisionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_HISTORY_LEN);
        Self { entries: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn record(&mut self, intent: Intent) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(intent);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<Intent> {
        self.entries.back().copied()
    }

    /// The most recent `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = Intent> + '_ {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).copied()
    }

    /// Occurrences of `intent` among the most recent `n` entries.
    pub fn count_recent(&self, n: usize, intent: Intent) -> usize {
        self.recent(n).filter(|i| *i == intent).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl FromIterator<Intent> for DecisionHistory {
    /// Collect into a full-size history, keeping the last entries.
    fn from_iter<I: IntoIterator<Item = Intent>>(iter: I) -> Self {
        let mut history = DecisionHistory::new(MAX_HISTORY_LEN);
        for intent in iter {
            history.record(intent);
        }
        history
    }
}
