//! The `OutputWriter` trait implemented by all backend writers.

use crate::{AgentCounterRow, HealthRow, OutputResult, TickSummaryRow};

/// Trait implemented by the CSV and SQLite writers.
///
/// The observer never propagates these errors into the tick loop; it keeps
/// the first one for [`TelemetryObserver::take_error`][crate::TelemetryObserver::take_error].
pub trait OutputWriter {
    /// Write one tick summary row.
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Write one governor evaluation.
    fn write_health(&mut self, row: &HealthRow) -> OutputResult<()>;

    /// Write the per-agent counters of one telemetry snapshot.
    fn write_agent_counters(&mut self, rows: &[AgentCounterRow]) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
