//! `TelemetryObserver<W>`: bridges `BrainObserver` to an `OutputWriter`.

use log::warn;

use hive_core::Tick;
use hive_sim::{BrainObserver, TelemetrySnapshot, TickReport};

use crate::row::{AgentCounterRow, HealthRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`BrainObserver`] that writes tick summaries, governor evaluations and
/// per-agent counters to any [`OutputWriter`] backend.
///
/// Writer errors are stored because observer callbacks cannot fail the tick
/// loop.  After `brain.run()` returns, check with
/// [`take_error`][Self::take_error].
pub struct TelemetryObserver<W: OutputWriter> {
    writer:     W,
    rows:       u64,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> TelemetryObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, rows: 0, last_error: None }
    }

    /// Take the stored write error, if any.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Rows handed to the writer so far, across all tables.
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>, rows: u64) {
        match result {
            Ok(()) => self.rows += rows,
            Err(e) => {
                // Keep only the first error.
                if self.last_error.is_none() {
                    warn!("telemetry output failed: {e}");
                    self.last_error = Some(e);
                }
            }
        }
    }
}

impl<W: OutputWriter> BrainObserver for TelemetryObserver<W> {
    fn on_tick_end(&mut self, report: &TickReport) {
        let result = self.writer.write_tick_summary(&TickSummaryRow::from(report));
        self.store_err(result, 1);

        if let Some(health) = &report.health {
            let result = self.writer.write_health(&HealthRow::new(report.tick, health));
            self.store_err(result, 1);
        }
    }

    fn on_snapshot(&mut self, snapshot: &TelemetrySnapshot) {
        let rows: Vec<AgentCounterRow> = snapshot
            .agents
            .iter()
            .map(|c| AgentCounterRow::new(snapshot.tick, c))
            .collect();

        if !rows.is_empty() {
            let result = self.writer.write_agent_counters(&rows);
            self.store_err(result, rows.len() as u64);
        }
    }

    fn on_stop(&mut self, _final_tick: Tick) {
        let result = self.writer.finish();
        self.store_err(result, 0);
    }
}
