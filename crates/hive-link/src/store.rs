//! The `BackoffStore`: sparse per-agent backoff state plus the degraded set.

use std::collections::{BTreeMap, BTreeSet};

use hive_core::AgentId;

use crate::BackoffState;

/// Only agents that are currently failing have a `states` entry; only agents
/// that exhausted their attempts are in `degraded`.  An agent is never in
/// both.
#[derive(Debug, Default)]
pub struct BackoffStore {
    states: BTreeMap<AgentId, BackoffState>,
    degraded: BTreeSet<AgentId>,
}

impl BackoffStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, agent: AgentId) -> Option<&BackoffState> {
        self.states.get(&agent)
    }

    pub fn get_mut(&mut self, agent: AgentId) -> Option<&mut BackoffState> {
        self.states.get_mut(&agent)
    }

    pub fn insert(&mut self, agent: AgentId, state: BackoffState) {
        self.states.insert(agent, state);
    }

    /// Drop backoff state (successful reconnect).
    pub fn clear(&mut self, agent: AgentId) -> Option<BackoffState> {
        self.states.remove(&agent)
    }

    /// Move `agent` from backoff to the degraded set.
    pub fn degrade(&mut self, agent: AgentId) {
        self.states.remove(&agent);
        self.degraded.insert(agent);
    }

    pub fn is_degraded(&self, agent: AgentId) -> bool {
        self.degraded.contains(&agent)
    }

    /// Forget everything about `agent`.  Returns `true` if it was degraded.
    pub fn reset(&mut self, agent: AgentId) -> bool {
        self.states.remove(&agent);
        self.degraded.remove(&agent)
    }

    /// Drop backoff state for agents no longer live.  Degraded marks stay
    /// until an explicit reset.
    pub fn retain_live(&mut self, live: &BTreeSet<AgentId>) -> usize {
        let before = self.states.len();
        self.states.retain(|a, _| live.contains(a));
        before - self.states.len()
    }

    pub fn pending_len(&self) -> usize {
        self.states.len()
    }

    pub fn degraded_len(&self) -> usize {
        self.degraded.len()
    }
}
