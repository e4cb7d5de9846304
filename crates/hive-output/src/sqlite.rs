//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! three tables: `tick_summaries`, `health` and `agent_counters`.

use std::path::Path;

use rusqlite::Connection;

use crate::{AgentCounterRow, HealthRow, OutputResult, TickSummaryRow};
use crate::writer::OutputWriter;

/// Writes telemetry output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS tick_summaries (
                 tick          INTEGER PRIMARY KEY,
                 started_at_ms INTEGER NOT NULL,
                 elapsed_ms    INTEGER NOT NULL,
                 interval_ms   INTEGER NOT NULL,
                 live          INTEGER NOT NULL,
                 deliberated   INTEGER NOT NULL,
                 deferred      INTEGER NOT NULL,
                 held          INTEGER NOT NULL,
                 applied       INTEGER NOT NULL,
                 oracle        INTEGER NOT NULL,
                 rules         INTEGER NOT NULL,
                 fallback      INTEGER NOT NULL,
                 cache         INTEGER NOT NULL,
                 mind          INTEGER NOT NULL,
                 held_override INTEGER NOT NULL,
                 sink_errors   INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS health (
                 tick                  INTEGER NOT NULL,
                 checked_at_ms         INTEGER NOT NULL,
                 status                TEXT    NOT NULL,
                 mode                  TEXT    NOT NULL,
                 throttle              TEXT    NOT NULL,
                 cpu_percent           REAL    NOT NULL,
                 memory_percent        REAL    NOT NULL,
                 consecutive_unhealthy INTEGER NOT NULL,
                 self_healing          INTEGER NOT NULL,
                 actions               TEXT    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS agent_counters (
                 agent           INTEGER NOT NULL,
                 tick            INTEGER NOT NULL,
                 oracle          INTEGER NOT NULL,
                 rules           INTEGER NOT NULL,
                 fallback        INTEGER NOT NULL,
                 cache           INTEGER NOT NULL,
                 mind            INTEGER NOT NULL,
                 held_override   INTEGER NOT NULL,
                 need_overrides  INTEGER NOT NULL,
                 stuck_overrides INTEGER NOT NULL,
                 nudges          INTEGER NOT NULL,
                 degraded        INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO tick_summaries \
             (tick, started_at_ms, elapsed_ms, interval_ms, live, deliberated, deferred, held, \
              applied, oracle, rules, fallback, cache, mind, held_override, sink_errors) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            rusqlite::params![
                row.tick,
                row.started_at_ms,
                row.elapsed_ms,
                row.interval_ms,
                row.live,
                row.deliberated,
                row.deferred,
                row.held,
                row.applied,
                row.oracle,
                row.rules,
                row.fallback,
                row.cache,
                row.mind,
                row.held_override,
                row.sink_errors,
            ],
        )?;
        Ok(())
    }

    fn write_health(&mut self, row: &HealthRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO health \
             (tick, checked_at_ms, status, mode, throttle, cpu_percent, memory_percent, \
              consecutive_unhealthy, self_healing, actions) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                row.tick,
                row.checked_at_ms,
                row.status,
                row.mode,
                row.throttle,
                row.cpu_percent,
                row.memory_percent,
                row.consecutive_unhealthy,
                row.self_healing as i64,
                row.actions,
            ],
        )?;
        Ok(())
    }

    fn write_agent_counters(&mut self, rows: &[AgentCounterRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO agent_counters \
                 (agent, tick, oracle, rules, fallback, cache, mind, held_override, \
                  need_overrides, stuck_overrides, nudges, degraded) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.agent,
                    row.tick,
                    row.oracle,
                    row.rules,
                    row.fallback,
                    row.cache,
                    row.mind,
                    row.held_override,
                    row.need_overrides,
                    row.stuck_overrides,
                    row.nudges,
                    row.degraded as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
