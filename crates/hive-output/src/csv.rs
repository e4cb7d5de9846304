//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `tick_summaries.csv`
//! - `health.csv`
//! - `agent_counters.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::{AgentCounterRow, HealthRow, OutputResult, TickSummaryRow};
use crate::writer::OutputWriter;

pub const TICK_SUMMARY_HEADER: [&str; 16] = [
    "tick", "started_at_ms", "elapsed_ms", "interval_ms", "live", "deliberated", "deferred",
    "held", "applied", "oracle", "rules", "fallback", "cache", "mind", "held_override",
    "sink_errors",
];

pub const HEALTH_HEADER: [&str; 10] = [
    "tick", "checked_at_ms", "status", "mode", "throttle", "cpu_percent", "memory_percent",
    "consecutive_unhealthy", "self_healing", "actions",
];

pub const AGENT_COUNTER_HEADER: [&str; 12] = [
    "agent", "tick", "oracle", "rules", "fallback", "cache", "mind", "held_override",
    "need_overrides", "stuck_overrides", "nudges", "degraded",
];

/// Writes telemetry output to three CSV files.
pub struct CsvWriter {
    summaries: Writer<File>,
    health:    Writer<File>,
    agents:    Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create the three CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record(TICK_SUMMARY_HEADER)?;

        let mut health = Writer::from_path(dir.join("health.csv"))?;
        health.write_record(HEALTH_HEADER)?;

        let mut agents = Writer::from_path(dir.join("agent_counters.csv"))?;
        agents.write_record(AGENT_COUNTER_HEADER)?;

        Ok(Self {
            summaries,
            health,
            agents,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.started_at_ms.to_string(),
            row.elapsed_ms.to_string(),
            row.interval_ms.to_string(),
            row.live.to_string(),
            row.deliberated.to_string(),
            row.deferred.to_string(),
            row.held.to_string(),
            row.applied.to_string(),
            row.oracle.to_string(),
            row.rules.to_string(),
            row.fallback.to_string(),
            row.cache.to_string(),
            row.mind.to_string(),
            row.held_override.to_string(),
            row.sink_errors.to_string(),
        ])?;
        Ok(())
    }

    fn write_health(&mut self, row: &HealthRow) -> OutputResult<()> {
        self.health.write_record(&[
            row.tick.to_string(),
            row.checked_at_ms.to_string(),
            row.status.to_owned(),
            row.mode.to_owned(),
            row.throttle.to_owned(),
            format!("{:.1}", row.cpu_percent),
            format!("{:.1}", row.memory_percent),
            row.consecutive_unhealthy.to_string(),
            (row.self_healing as u8).to_string(),
            row.actions.clone(),
        ])?;
        Ok(())
    }

    fn write_agent_counters(&mut self, rows: &[AgentCounterRow]) -> OutputResult<()> {
        for row in rows {
            self.agents.write_record(&[
                row.agent.to_string(),
                row.tick.to_string(),
                row.oracle.to_string(),
                row.rules.to_string(),
                row.fallback.to_string(),
                row.cache.to_string(),
                row.mind.to_string(),
                row.held_override.to_string(),
                row.need_overrides.to_string(),
                row.stuck_overrides.to_string(),
                row.nudges.to_string(),
                (row.degraded as u8).to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.summaries.flush()?;
        self.health.flush()?;
        self.agents.flush()?;
        Ok(())
    }
}
