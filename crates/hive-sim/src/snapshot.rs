//! Read-only telemetry export for the reporting layer.

use serde::Serialize;

use hive_behavior::{AdaptReason, CacheStats, DecisionSource, OracleStats};
use hive_core::{AgentId, Millis, Tick};
use hive_governor::ResourceHealth;

use crate::BrainState;

/// Decisions per [`DecisionSource`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub oracle: u64,
    pub rules: u64,
    pub fallback: u64,
    pub cache: u64,
    pub mind: u64,
    pub held: u64,
}

impl SourceCounts {
    pub fn record(&mut self, source: DecisionSource) {
        *self.slot(source) += 1;
    }

    pub fn get(&self, source: DecisionSource) -> u64 {
        match source {
            DecisionSource::Oracle   => self.oracle,
            DecisionSource::Rules    => self.rules,
            DecisionSource::Fallback => self.fallback,
            DecisionSource::Cache    => self.cache,
            DecisionSource::Mind     => self.mind,
            DecisionSource::Held     => self.held,
        }
    }

    pub fn total(&self) -> u64 {
        DecisionSource::ALL.iter().map(|&s| self.get(s)).sum()
    }

    pub fn merge(&mut self, other: &SourceCounts) {
        for s in DecisionSource::ALL {
            *self.slot(s) += other.get(s);
        }
    }

    fn slot(&mut self, source: DecisionSource) -> &mut u64 {
        match source {
            DecisionSource::Oracle   => &mut self.oracle,
            DecisionSource::Rules    => &mut self.rules,
            DecisionSource::Fallback => &mut self.fallback,
            DecisionSource::Cache    => &mut self.cache,
            DecisionSource::Mind     => &mut self.mind,
            DecisionSource::Held     => &mut self.held,
        }
    }
}

/// How often the adaptation layer replaced a proposed intent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OverrideCounts {
    pub need: u64,
    pub stuck: u64,
    pub nudge: u64,
}

impl OverrideCounts {
    pub fn record(&mut self, reason: AdaptReason) {
        match reason {
            AdaptReason::Unchanged    => {}
            AdaptReason::NeedOverride => self.need += 1,
            AdaptReason::StuckLoop    => self.stuck += 1,
            AdaptReason::Nudge        => self.nudge += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.need + self.stuck + self.nudge
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentCounters {
    pub agent: AgentId,
    pub sources: SourceCounts,
    pub overrides: OverrideCounts,
    /// Reconnect attempts exhausted; waiting for an external reset.
    pub degraded: bool,
}

/// Everything the dashboard layer may see.  Taken on demand with
/// [`Brain::snapshot`][crate::Brain::snapshot]; never shares live state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub tick: Tick,
    pub taken_at: Millis,
    pub state: BrainState,
    pub health: ResourceHealth,
    pub oracle_name: String,
    pub oracle: OracleStats,
    pub oracle_panics: u64,
    pub cache: CacheStats,
    /// Sum over `agents`.
    pub sources: SourceCounts,
    pub agents: Vec<AgentCounters>,
}

impl TelemetrySnapshot {
    pub fn degraded_agents(&self) -> usize {
        self.agents.iter().filter(|a| a.degraded).count()
    }
}
