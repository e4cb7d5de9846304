//! Integration tests for hive-output.

use std::time::Duration;

use tempfile::TempDir;

use hive_core::{AgentId, Millis, Tick};
use hive_governor::{GovernorAction, GovernorReport, HealthStatus, OperatingMode, ResourceHealth, Throttle};
use hive_sim::{AgentCounters, OverrideCounts, SourceCounts, TickReport};

use crate::row::{AgentCounterRow, HealthRow, TickSummaryRow};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn tmp() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

fn report(tick: u64) -> TickReport {
    TickReport {
        tick:        Tick(tick),
        started_at:  Millis(tick * 500),
        elapsed:     Duration::from_millis(12),
        interval:    Duration::from_millis(500),
        live:        4,
        deliberated: 2,
        held:        1,
        sources:     SourceCounts { oracle: 2, mind: 1, ..SourceCounts::default() },
        sink_errors: 1,
        ..TickReport::default()
    }
}

fn critical() -> GovernorReport {
    GovernorReport {
        health: ResourceHealth {
            status:                HealthStatus::Critical,
            cpu_percent:           91.3,
            memory_percent:        40.0,
            mode:                  OperatingMode::Eco,
            throttle:              Throttle::Max,
            consecutive_unhealthy: 3,
            self_healing:          true,
            last_check:            Millis(20_000),
        },
        actions: vec![
            GovernorAction::EngageThrottle(Throttle::Max),
            GovernorAction::SelfHeal,
        ],
    }
}

fn counters(agent: u32) -> AgentCounters {
    AgentCounters {
        agent:     AgentId(agent),
        sources:   SourceCounts { rules: 3, fallback: 1, ..SourceCounts::default() },
        overrides: OverrideCounts { need: 2, ..OverrideCounts::default() },
        degraded:  agent == 1,
    }
}

fn headers(path: &std::path::Path) -> Vec<String> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    rdr.headers().unwrap().iter().map(str::to_owned).collect()
}

fn records(path: &std::path::Path) -> Vec<csv::StringRecord> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    rdr.records().map(|r| r.unwrap()).collect()
}

// ── Rows ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod rows {
    use super::*;

    #[test]
    fn tick_summary_from_report() {
        let row = TickSummaryRow::from(&report(3));
        assert_eq!(row.tick, 3);
        assert_eq!(row.started_at_ms, 1_500);
        assert_eq!(row.elapsed_ms, 12);
        assert_eq!(row.interval_ms, 500);
        assert_eq!((row.live, row.deliberated, row.held), (4, 2, 1));
        assert_eq!((row.oracle, row.mind, row.rules), (2, 1, 0));
        assert_eq!(row.applied, 0, "no AppliedDecision entries in the report");
        assert_eq!(row.sink_errors, 1);
    }

    #[test]
    fn health_row_labels() {
        let row = HealthRow::new(Tick(40), &critical());
        assert_eq!(row.tick, 40);
        assert_eq!(row.checked_at_ms, 20_000);
        assert_eq!((row.status, row.mode, row.throttle), ("CRITICAL", "ECO", "MAX"));
        assert_eq!(row.actions, "throttle;self_heal");
        assert!(row.self_healing);
    }

    #[test]
    fn health_row_without_actions() {
        let report = GovernorReport { health: ResourceHealth::default(), actions: Vec::new() };
        let row = HealthRow::new(Tick(0), &report);
        assert_eq!(row.status, "HEALTHY");
        assert_eq!(row.throttle, "OFF");
        assert_eq!(row.actions, "");
    }

    #[test]
    fn agent_counter_row() {
        let row = AgentCounterRow::new(Tick(10), &counters(1));
        assert_eq!((row.agent, row.tick), (1, 10));
        assert_eq!((row.rules, row.fallback, row.need_overrides), (3, 1, 2));
        assert!(row.degraded);
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use super::*;

    use crate::csv::{CsvWriter, AGENT_COUNTER_HEADER, HEALTH_HEADER, TICK_SUMMARY_HEADER};
    use crate::writer::OutputWriter;

    #[test]
    fn csv_files_created_with_headers() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        assert_eq!(headers(&dir.path().join("tick_summaries.csv")), TICK_SUMMARY_HEADER);
        assert_eq!(headers(&dir.path().join("health.csv")), HEALTH_HEADER);
        assert_eq!(headers(&dir.path().join("agent_counters.csv")), AGENT_COUNTER_HEADER);
    }

    #[test]
    fn csv_tick_summary_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_tick_summary(&TickSummaryRow::from(&report(7))).unwrap();
        w.finish().unwrap();

        let rows = records(&dir.path().join("tick_summaries.csv"));
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "7");     // tick
        assert_eq!(&rows[0][1], "3500");  // started_at_ms
        assert_eq!(&rows[0][9], "2");     // oracle
        assert_eq!(&rows[0][15], "1");    // sink_errors
    }

    #[test]
    fn csv_health_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_health(&HealthRow::new(Tick(40), &critical())).unwrap();
        w.finish().unwrap();

        let rows = records(&dir.path().join("health.csv"));
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][2], "CRITICAL");
        assert_eq!(&rows[0][5], "91.3");
        assert_eq!(&rows[0][8], "1");
        assert_eq!(&rows[0][9], "throttle;self_heal");
    }

    #[test]
    fn csv_agent_counters_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let rows: Vec<_> = (0..3).map(|a| AgentCounterRow::new(Tick(10), &counters(a))).collect();
        w.write_agent_counters(&rows).unwrap();
        w.write_agent_counters(&[]).unwrap();
        w.finish().unwrap();

        let read = records(&dir.path().join("agent_counters.csv"));
        assert_eq!(read.len(), 3);
        assert_eq!(&read[1][0], "1");
        assert_eq!(&read[1][11], "1"); // degraded
        assert_eq!(&read[2][11], "0");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tmp();
        assert!(CsvWriter::new(&dir.path().join("nope")).is_err());
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use super::*;

    use hive_agent::{AgentSituation, Needs};
    use hive_core::{HiveConfig, ManualClock, Role};
    use hive_governor::ManualProbe;
    use hive_link::AlwaysConnected;
    use hive_sim::{
        BrainBuilder, BrainObserver, BrainResult, DiscardSink, Observation, TelemetrySnapshot,
        WorldView,
    };

    use crate::observer::TelemetryObserver;
    use crate::writer::OutputWriter;
    use crate::{OutputError, OutputResult};

    /// Writer that fails every health write.
    #[derive(Default)]
    struct Flaky {
        summaries: usize,
        finished: bool,
    }

    impl OutputWriter for Flaky {
        fn write_tick_summary(&mut self, _row: &TickSummaryRow) -> OutputResult<()> {
            self.summaries += 1;
            Ok(())
        }

        fn write_health(&mut self, _row: &HealthRow) -> OutputResult<()> {
            Err(OutputError::Io(std::io::Error::other("disk full")))
        }

        fn write_agent_counters(&mut self, _rows: &[AgentCounterRow]) -> OutputResult<()> {
            Ok(())
        }

        fn finish(&mut self) -> OutputResult<()> {
            self.finished = true;
            Ok(())
        }
    }

    struct Calm(Vec<AgentSituation>);

    impl WorldView for Calm {
        fn live_agents(&self) -> Vec<AgentId> {
            self.0.iter().map(|s| s.agent).collect()
        }

        fn observe(&self, agent: AgentId) -> Option<Observation> {
            self.0.iter().find(|s| s.agent == agent).cloned().map(Observation::new)
        }
    }

    #[test]
    fn first_error_is_kept_and_ticks_continue() {
        let mut obs = TelemetryObserver::new(Flaky::default());
        let mut with_health = report(0);
        with_health.health = Some(critical());

        obs.on_tick_end(&with_health);
        obs.on_tick_end(&with_health);
        obs.on_tick_end(&report(1));
        obs.on_stop(Tick(3));

        assert_eq!(obs.rows_written(), 3, "summaries only");
        assert!(matches!(obs.take_error(), Some(OutputError::Io(_))));
        assert!(obs.take_error().is_none());
        let writer = obs.into_writer();
        assert_eq!(writer.summaries, 3);
        assert!(writer.finished);
    }

    #[test]
    fn empty_snapshot_writes_nothing() {
        let mut obs = TelemetryObserver::new(Flaky::default());
        let brain = BrainBuilder::new(HiveConfig::default(), Calm(Vec::new()), DiscardSink, AlwaysConnected)
            .probe(ManualProbe::new(10.0, 10.0))
            .clock(ManualClock::new())
            .build()
            .unwrap();
        let snapshot: TelemetrySnapshot = brain.snapshot();
        obs.on_snapshot(&snapshot);
        assert_eq!(obs.rows_written(), 0);
    }

    #[test]
    fn brain_run_to_csv() -> BrainResult<()> {
        let mut cfg = HiveConfig::default();
        cfg.resources.allow_performance = false;
        let world = Calm(
            (0..3)
                .map(|i| AgentSituation::new(AgentId(i), Role::Farmer).with_needs(Needs::new(10.0, 10.0, 0.0, 10.0)))
                .collect(),
        );
        let mut brain = BrainBuilder::new(cfg, world, DiscardSink, AlwaysConnected)
            .probe(ManualProbe::new(10.0, 10.0))
            .clock(ManualClock::new())
            .build()?;

        let dir = tmp();
        let mut obs = TelemetryObserver::new(crate::CsvWriter::new(dir.path()).unwrap());
        let reports = brain.run_ticks(12, &mut obs)?;
        obs.on_stop(brain.tick());
        assert!(obs.take_error().is_none(), "no write errors expected");

        let summaries = records(&dir.path().join("tick_summaries.csv"));
        assert_eq!(summaries.len(), 12);
        assert_eq!(&summaries[11][0], "11");
        let applied: usize = reports.iter().map(|r| r.decisions.len()).sum();
        let applied_csv: usize = summaries.iter().map(|r| r[8].parse::<usize>().unwrap()).sum();
        assert_eq!(applied, applied_csv);

        // One governor check at t=0; the next is due at 10 s, after the run.
        let health = records(&dir.path().join("health.csv"));
        assert_eq!(health.len(), 1);
        assert_eq!(&health[0][2], "HEALTHY");
        assert_eq!(&health[0][3], "NORMAL");

        // Snapshots at ticks 0 and 10, three agents each.
        let agents = records(&dir.path().join("agent_counters.csv"));
        assert_eq!(agents.len(), 6);
        assert_eq!(&agents[3][1], "10");
        Ok(())
    }
}

// ── SQLite tests ──────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use super::*;

    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;

    fn count(dir: &TempDir, table: &str) -> i64 {
        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("output.db").exists());
    }

    #[test]
    fn sqlite_tick_summary() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_tick_summary(&TickSummaryRow::from(&report(7))).unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        let (tick, started, oracle): (i64, i64, i64) = conn.query_row(
            "SELECT tick, started_at_ms, oracle FROM tick_summaries WHERE tick = 7",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        ).unwrap();
        assert_eq!((tick, started, oracle), (7, 3_500, 2));
    }

    #[test]
    fn sqlite_health_text_columns() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_health(&HealthRow::new(Tick(40), &critical())).unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        let (status, healing, cpu): (String, i64, f64) = conn.query_row(
            "SELECT status, self_healing, cpu_percent FROM health WHERE tick = 40",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        ).unwrap();
        assert_eq!(status, "CRITICAL");
        assert_eq!(healing, 1);
        assert!((cpu - 91.3).abs() < 1e-9);
    }

    #[test]
    fn sqlite_agent_counters_in_one_transaction() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        let rows: Vec<_> = (0..4).map(|a| AgentCounterRow::new(Tick(20), &counters(a))).collect();
        w.write_agent_counters(&rows).unwrap();
        w.write_agent_counters(&[]).unwrap();
        w.finish().unwrap();
        assert_eq!(count(&dir, "agent_counters"), 4);
    }
}
