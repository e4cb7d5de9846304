//! Scheduler observer trait and the per-tick report.

use std::time::Duration;

use serde::Serialize;

use hive_behavior::{AdaptReason, DecisionSource};
use hive_core::{AgentId, Intent, Millis, Tick};
use hive_governor::GovernorReport;
use hive_link::ReconcileReport;

use crate::{SourceCounts, TelemetrySnapshot};

/// One intent handed to the action sink.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
pub struct AppliedDecision {
    pub agent: AgentId,
    pub intent: Intent,
    pub source: DecisionSource,
    pub reason: AdaptReason,
}

/// What happened during one tick.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub tick: Tick,
    pub started_at: Millis,
    pub elapsed: Duration,
    /// Interval the governor asked for when the tick ended.
    pub interval: Duration,
    pub live: usize,
    /// Live agents that could not be observed this tick.
    pub unobserved: usize,
    /// Agents sent to the oracle client.
    pub deliberated: usize,
    /// Agents that wanted deliberation but fell outside the batch window.
    pub deferred: usize,
    /// Agents inside their re-decision interval.
    pub held: usize,
    /// Decisions applied this tick, ascending by agent.
    pub decisions: Vec<AppliedDecision>,
    pub sources: SourceCounts,
    pub sink_errors: usize,
    /// Set when the knowledge snapshot was rebuilt this tick.
    pub advice: Option<Vec<String>>,
    pub health: Option<GovernorReport>,
    pub reconcile: Option<ReconcileReport>,
}

impl TickReport {
    pub fn decision_for(&self, agent: AgentId) -> Option<&AppliedDecision> {
        self.decisions.iter().find(|d| d.agent == agent)
    }

    /// `elapsed` went past `ratio` of the interval budget.
    pub fn over_budget(&self, ratio: f64) -> bool {
        self.elapsed.as_secs_f64() > self.interval.as_secs_f64() * ratio
    }
}

/// Callbacks invoked by [`Brain::run`][crate::Brain::run] and
/// [`Brain::run_ticks`][crate::Brain::run_ticks].
///
/// All methods default to no-ops.  An observer that wants to end the run
/// keeps a clone of [`Brain::stop_handle`][crate::Brain::stop_handle].
///
/// # Example: stop after a wall-clock budget
///
/// ```rust,ignore
/// struct Deadline { stop: StopHandle, at: Millis }
///
/// impl BrainObserver for Deadline {
///     fn on_tick_end(&mut self, report: &TickReport) {
///         if report.started_at >= self.at {
///             self.stop.stop();
///         }
///     }
/// }
/// ```
pub trait BrainObserver {
    /// Called once when the scheduler enters TICKING.
    fn on_start(&mut self, _at: Millis) {}

    fn on_tick_start(&mut self, _tick: Tick) {}

    fn on_tick_end(&mut self, _report: &TickReport) {}

    /// Called every `snapshot_every` ticks.
    fn on_snapshot(&mut self, _snapshot: &TelemetrySnapshot) {}

    /// Called once after the last tick, whoever requested the stop.
    fn on_stop(&mut self, _final_tick: Tick) {}
}

/// A [`BrainObserver`] that does nothing.
pub struct NoopObserver;

impl BrainObserver for NoopObserver {}
