//! `hive-output`: telemetry writers for the hive loop.
//!
//! Two backends are provided:
//!
//! | Feature   | Backend | Files created                                              |
//! |-----------|---------|------------------------------------------------------------|
//! | *(none)*  | CSV     | `tick_summaries.csv`, `health.csv`, `agent_counters.csv`   |
//! | `sqlite`  | SQLite  | `output.db`                                                |
//!
//! Both implement [`OutputWriter`] and are driven by [`TelemetryObserver`],
//! which implements `hive_sim::BrainObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hive_output::{CsvWriter, TelemetryObserver};
//!
//! let writer = CsvWriter::new(Path::new("./telemetry"))?;
//! let mut obs = TelemetryObserver::new(writer);
//! brain.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::TelemetryObserver;
pub use row::{AgentCounterRow, HealthRow, TickSummaryRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
