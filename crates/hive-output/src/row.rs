//! Plain data row types written by output backends.

use hive_core::Tick;
use hive_governor::{GovernorAction, GovernorReport};
use hive_sim::{AgentCounters, TickReport};

/// One scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummaryRow {
    pub tick:          u64,
    pub started_at_ms: u64,
    pub elapsed_ms:    u64,
    pub interval_ms:   u64,
    pub live:          u64,
    pub deliberated:   u64,
    pub deferred:      u64,
    pub held:          u64,
    pub applied:       u64,
    pub oracle:        u64,
    pub rules:         u64,
    pub fallback:      u64,
    pub cache:         u64,
    pub mind:          u64,
    /// Emergency overrides applied to agents inside their re-decision interval.
    pub held_override: u64,
    pub sink_errors:   u64,
}

impl From<&TickReport> for TickSummaryRow {
    fn from(r: &TickReport) -> Self {
        Self {
            tick:          r.tick.0,
            started_at_ms: r.started_at.0,
            elapsed_ms:    r.elapsed.as_millis() as u64,
            interval_ms:   r.interval.as_millis() as u64,
            live:          r.live as u64,
            deliberated:   r.deliberated as u64,
            deferred:      r.deferred as u64,
            held:          r.held as u64,
            applied:       r.decisions.len() as u64,
            oracle:        r.sources.oracle,
            rules:         r.sources.rules,
            fallback:      r.sources.fallback,
            cache:         r.sources.cache,
            mind:          r.sources.mind,
            held_override: r.sources.held,
            sink_errors:   r.sink_errors as u64,
        }
    }
}

/// One governor evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthRow {
    pub tick:                  u64,
    pub checked_at_ms:         u64,
    pub status:                &'static str,
    pub mode:                  &'static str,
    pub throttle:              &'static str,
    pub cpu_percent:           f64,
    pub memory_percent:        f64,
    pub consecutive_unhealthy: u32,
    pub self_healing:          bool,
    /// Actions the governor requested, `;`-separated.  Empty when none.
    pub actions:               String,
}

impl HealthRow {
    pub fn new(tick: Tick, report: &GovernorReport) -> Self {
        let h = &report.health;
        Self {
            tick:                  tick.0,
            checked_at_ms:         h.last_check.0,
            status:                h.status.as_str(),
            mode:                  h.mode.as_str(),
            throttle:              h.throttle.as_str(),
            cpu_percent:           h.cpu_percent,
            memory_percent:        h.memory_percent,
            consecutive_unhealthy: h.consecutive_unhealthy,
            self_healing:          h.self_healing,
            actions:               report.actions.iter().map(|&a| action_label(a)).collect::<Vec<_>>().join(";"),
        }
    }
}

fn action_label(action: GovernorAction) -> &'static str {
    match action {
        GovernorAction::ReclaimMemory { aggressive: false } => "reclaim",
        GovernorAction::ReclaimMemory { aggressive: true }  => "reclaim_aggressive",
        GovernorAction::EvictDecisionCache                  => "evict_cache",
        GovernorAction::EngageThrottle(_)                   => "throttle",
        GovernorAction::SelfHeal                            => "self_heal",
        GovernorAction::Recovered                           => "recovered",
    }
}

/// Cumulative counters for one agent as of a telemetry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentCounterRow {
    pub agent:           u32,
    pub tick:            u64,
    pub oracle:          u64,
    pub rules:           u64,
    pub fallback:        u64,
    pub cache:           u64,
    pub mind:            u64,
    pub held_override:   u64,
    pub need_overrides:  u64,
    pub stuck_overrides: u64,
    pub nudges:          u64,
    pub degraded:        bool,
}

impl AgentCounterRow {
    pub fn new(tick: Tick, c: &AgentCounters) -> Self {
        Self {
            agent:           c.agent.0,
            tick:            tick.0,
            oracle:          c.sources.oracle,
            rules:           c.sources.rules,
            fallback:        c.sources.fallback,
            cache:           c.sources.cache,
            mind:            c.sources.mind,
            held_override:   c.sources.held,
            need_overrides:  c.overrides.need,
            stuck_overrides: c.overrides.stuck,
            nudges:          c.overrides.nudge,
            degraded:        c.degraded,
        }
    }
}
