//! The connection watchdog: reconciles live agents against their links.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use serde::Serialize;

use hive_core::{AgentId, Millis, ReconnectConfig};

use crate::{BackoffState, BackoffStore, ConnectionStatus, Connector};

/// Outcome of one [`Watchdog::reconcile`] pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub attempted: Vec<AgentId>,
    pub reconnected: Vec<AgentId>,
    pub failed: Vec<AgentId>,
    /// Agents that used their last attempt in this pass.
    pub newly_degraded: Vec<AgentId>,
    /// Disconnected agents still inside their backoff delay.
    pub waiting: usize,
    /// Disconnected agents skipped because they are degraded.
    pub degraded: usize,
}

/// Owns all backoff state; nothing else mutates it.
///
/// # Per-agent rules
///
/// | Link status    | State                     | Action                        |
/// |----------------|---------------------------|-------------------------------|
/// | `Connected`    | any                       | clear backoff                 |
/// | `Connecting`   | any                       | leave alone                   |
/// | `Disconnected` | degraded                  | skip (manual reset required)  |
/// | `Disconnected` | none                      | attempt now                   |
/// | `Disconnected` | delay elapsed             | attempt                       |
/// | `Disconnected` | inside delay              | wait                          |
///
/// A failed attempt grows the delay (`base × multiplier^(n-1)`, capped).
/// The attempt that reaches `max_attempts` moves the agent to the degraded
/// set and deletes its backoff state.
pub struct Watchdog<C: Connector> {
    pub connector: C,
    cfg: ReconnectConfig,
    store: BackoffStore,
}

impl<C: Connector> Watchdog<C> {
    pub fn new(connector: C, cfg: ReconnectConfig) -> Self {
        Self { connector, cfg, store: BackoffStore::new() }
    }

    pub fn store(&self) -> &BackoffStore {
        &self.store
    }

    pub fn is_degraded(&self, agent: AgentId) -> bool {
        self.store.is_degraded(agent)
    }

    /// External reset: the agent becomes eligible for reconnects again with
    /// a fresh attempt count.
    pub fn reset(&mut self, agent: AgentId) {
        if self.store.reset(agent) {
            info!("{agent} reset; reconnects re-enabled");
        }
    }

    pub fn reconcile(&mut self, live: &[AgentId], now: Millis) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let live_set: BTreeSet<AgentId> = live.iter().copied().collect();
        self.store.retain_live(&live_set);

        for &agent in &live_set {
            match self.connector.status(agent) {
                ConnectionStatus::Connected => {
                    self.store.clear(agent);
                }
                ConnectionStatus::Connecting => {}
                ConnectionStatus::Disconnected => {
                    if self.store.is_degraded(agent) {
                        report.degraded += 1;
                        continue;
                    }
                    if self.store.get(agent).is_some_and(|s| !s.is_ready(now)) {
                        report.waiting += 1;
                        continue;
                    }
                    self.attempt(agent, now, &mut report);
                }
            }
        }
        report
    }

    fn attempt(&mut self, agent: AgentId, now: Millis, report: &mut ReconcileReport) {
        report.attempted.push(agent);
        match self.connector.reconnect(agent) {
            Ok(()) => {
                if let Some(prev) = self.store.clear(agent) {
                    info!("{agent} reconnected after {} failed attempts", prev.attempts);
                }
                report.reconnected.push(agent);
            }
            Err(err) => {
                let state = match self.store.get_mut(agent) {
                    Some(state) => {
                        state.record_failure(now, &self.cfg);
                        *state
                    }
                    None => {
                        let state = BackoffState::after_first_failure(now, &self.cfg);
                        self.store.insert(agent, state);
                        state
                    }
                };
                debug!(
                    "{agent} reconnect attempt {}/{} failed: {err}; next in {:?}",
                    state.attempts, self.cfg.max_attempts, state.delay,
                );
                report.failed.push(agent);
                if state.is_exhausted(&self.cfg) {
                    warn!("{agent} exhausted {} reconnect attempts; marked degraded", self.cfg.max_attempts);
                    self.store.degrade(agent);
                    report.newly_degraded.push(agent);
                }
            }
        }
    }
}
