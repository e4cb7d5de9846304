//! Unit tests for hive-link.

use std::collections::BTreeMap;
use std::time::Duration;

use hive_core::{AgentId, Millis, ReconnectConfig};

use crate::{BackoffState, ConnectionStatus, Connector, LinkError, LinkResult, Watchdog};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Connector whose agents start disconnected and come back on a scripted
/// attempt number (or never).
#[derive(Default)]
struct ScriptedConnector {
    status: BTreeMap<AgentId, ConnectionStatus>,
    succeed_on: BTreeMap<AgentId, u32>,
    attempts: BTreeMap<AgentId, u32>,
}

impl ScriptedConnector {
    fn disconnected(agents: &[u32]) -> Self {
        let mut c = Self::default();
        for &a in agents {
            c.status.insert(AgentId(a), ConnectionStatus::Disconnected);
        }
        c
    }

    fn succeed_on(mut self, agent: u32, attempt: u32) -> Self {
        self.succeed_on.insert(AgentId(agent), attempt);
        self
    }

    fn attempts(&self, agent: u32) -> u32 {
        self.attempts.get(&AgentId(agent)).copied().unwrap_or(0)
    }
}

impl Connector for ScriptedConnector {
    fn status(&self, agent: AgentId) -> ConnectionStatus {
        self.status.get(&agent).copied().unwrap_or(ConnectionStatus::Connected)
    }

    fn reconnect(&mut self, agent: AgentId) -> LinkResult<()> {
        let n = {
            let count = self.attempts.entry(agent).or_insert(0);
            *count += 1;
            *count
        };
        if self.succeed_on.get(&agent) == Some(&n) {
            self.status.insert(agent, ConnectionStatus::Connected);
            Ok(())
        } else {
            Err(LinkError::Refused(agent, "connection refused".into()))
        }
    }
}

fn ids(raw: &[u32]) -> Vec<AgentId> {
    raw.iter().map(|&a| AgentId(a)).collect()
}

fn secs(s: u64) -> Millis {
    Millis(s * 1_000)
}

// ── BackoffState ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod backoff_state {
    use super::*;

    #[test]
    fn delay_grows_and_readiness_follows() {
        let cfg = ReconnectConfig::default();
        let mut s = BackoffState::after_first_failure(secs(0), &cfg);
        assert_eq!(s.delay, Duration::from_secs(1));
        assert!(!s.is_ready(Millis(999)));
        assert!(s.is_ready(secs(1)));

        s.record_failure(secs(1), &cfg);
        assert_eq!((s.attempts, s.delay), (2, Duration::from_secs(2)));
        assert_eq!(s.next_attempt_at(), secs(3));
    }

    #[test]
    fn attempts_saturate_at_cap() {
        let cfg = ReconnectConfig { max_attempts: 2, ..ReconnectConfig::default() };
        let mut s = BackoffState::after_first_failure(secs(0), &cfg);
        for i in 1..10 {
            s.record_failure(secs(i * 100), &cfg);
        }
        assert_eq!(s.attempts, 2);
        assert!(s.is_exhausted(&cfg));
    }
}

// ── Watchdog ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod watchdog {
    use super::*;

    #[test]
    fn connected_agents_are_left_alone() {
        let mut w = Watchdog::new(ScriptedConnector::default(), ReconnectConfig::default());
        let report = w.reconcile(&ids(&[0, 1, 2]), secs(0));
        assert!(report.attempted.is_empty());
        assert_eq!(w.store().pending_len(), 0);
    }

    #[test]
    fn connecting_agents_are_not_retried() {
        let mut c = ScriptedConnector::default();
        c.status.insert(AgentId(4), ConnectionStatus::Connecting);
        let mut w = Watchdog::new(c, ReconnectConfig::default());
        let report = w.reconcile(&ids(&[4]), secs(0));
        assert!(report.attempted.is_empty());
        assert_eq!(w.connector.attempts(4), 0);
    }

    #[test]
    fn retries_follow_exponential_schedule() {
        let mut w = Watchdog::new(ScriptedConnector::disconnected(&[7]), ReconnectConfig::default());
        let live = ids(&[7]);
        let mut attempt_times = Vec::new();
        for ms in (0..=20_000).step_by(250) {
            let report = w.reconcile(&live, Millis(ms));
            if !report.attempted.is_empty() {
                attempt_times.push(ms);
            }
        }
        assert_eq!(attempt_times, vec![0, 1_000, 3_000, 7_000, 15_000]);
        assert!(w.is_degraded(AgentId(7)));
    }

    #[test]
    fn cap_is_never_exceeded_without_reset() {
        let cfg = ReconnectConfig::default();
        let mut w = Watchdog::new(ScriptedConnector::disconnected(&[1, 2]), cfg.clone());
        let live = ids(&[1, 2]);
        let mut degraded_events = 0;
        for s in 0..600 {
            let report = w.reconcile(&live, secs(s));
            degraded_events += report.newly_degraded.len();
            for agent in &live {
                if let Some(state) = w.store().get(*agent) {
                    assert!(state.attempts <= cfg.max_attempts);
                }
            }
        }
        assert_eq!(w.connector.attempts(1), cfg.max_attempts);
        assert_eq!(w.connector.attempts(2), cfg.max_attempts);
        assert_eq!(degraded_events, 2);
        assert_eq!(w.store().pending_len(), 0, "state deleted on reaching the cap");
        assert_eq!(w.store().degraded_len(), 2);
    }

    #[test]
    fn success_clears_state() {
        let c = ScriptedConnector::disconnected(&[3]).succeed_on(3, 3);
        let mut w = Watchdog::new(c, ReconnectConfig::default());
        let live = ids(&[3]);
        w.reconcile(&live, secs(0));
        w.reconcile(&live, secs(1));
        assert_eq!(w.store().get(AgentId(3)).map(|s| s.attempts), Some(2));
        let report = w.reconcile(&live, secs(3));
        assert_eq!(report.reconnected, ids(&[3]));
        assert!(w.store().get(AgentId(3)).is_none());
        assert!(w.reconcile(&live, secs(100)).attempted.is_empty());
    }

    #[test]
    fn reset_re_enables_reconnects() {
        let cfg = ReconnectConfig { max_attempts: 1, ..ReconnectConfig::default() };
        let mut w = Watchdog::new(ScriptedConnector::disconnected(&[9]), cfg);
        let live = ids(&[9]);
        assert_eq!(w.reconcile(&live, secs(0)).newly_degraded, ids(&[9]));
        let skipped = w.reconcile(&live, secs(500));
        assert!(skipped.attempted.is_empty());
        assert_eq!(skipped.degraded, 1);

        w.reset(AgentId(9));
        assert!(!w.is_degraded(AgentId(9)));
        assert_eq!(w.reconcile(&live, secs(501)).attempted, ids(&[9]));
        assert_eq!(w.connector.attempts(9), 2);
    }

    #[test]
    fn agents_are_independent() {
        let c = ScriptedConnector::disconnected(&[1, 2]).succeed_on(1, 1);
        let mut w = Watchdog::new(c, ReconnectConfig::default());
        let report = w.reconcile(&ids(&[1, 2]), secs(0));
        assert_eq!(report.reconnected, ids(&[1]));
        assert_eq!(report.failed, ids(&[2]));
        let waiting = w.reconcile(&ids(&[1, 2]), Millis(500));
        assert_eq!(waiting.waiting, 1);
    }

    #[test]
    fn departed_agents_lose_backoff_state() {
        let mut w = Watchdog::new(ScriptedConnector::disconnected(&[5, 6]), ReconnectConfig::default());
        w.reconcile(&ids(&[5, 6]), secs(0));
        assert_eq!(w.store().pending_len(), 2);
        w.reconcile(&ids(&[6]), Millis(100));
        assert!(w.store().get(AgentId(5)).is_none());
        assert!(w.store().get(AgentId(6)).is_some());
    }
}
