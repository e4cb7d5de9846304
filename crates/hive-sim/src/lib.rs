//! `hive-sim`: the tick scheduler ("central brain") of the hive loop.
//!
//! # Tick
//!
//! ```text
//! every governor.tick_interval():
//!   ① Refresh   world.refresh(); observe live agents; rebuild colony
//!                knowledge + advice when older than 5 s.
//!   ② Think     Mind::observe + Mind::think per agent
//!                (parallel with the `parallel` feature).
//!   ③ Dispatch  fresh, non-urgent verdicts inside the rotating batch
//!                window → one time-bounded OracleClient::decide call.
//!   ④ Apply     ascending AgentId: adapt → history → commit → sink.
//!   ⑤ Govern    telemetry poll; governor evaluate when due + actions;
//!                watchdog reconcile every N ticks.
//! ```
//!
//! # Components
//!
//! | Type            | Description                                              |
//! |-----------------|----------------------------------------------------------|
//! | [`Brain`]       | Owns every stateful component and runs the loop          |
//! | [`BrainBuilder`]| Wires oracle, probe, clock, connector; validates config   |
//! | [`StopHandle`]  | Cloneable `IDLE → TICKING → STOPPED` control              |
//! | [`WorldView`] / [`ActionSink`] | Read and write sides of the game adapter  |
//! | [`BrainObserver`] | Per-tick and snapshot callbacks                        |
//! | [`TelemetrySnapshot`] | Serializable export for dashboards                 |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the think phase on Rayon's thread pool.           |
//! | `fx-hash`  | FxHash for the per-tick decision index.                |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use hive_core::HiveConfig;
//! use hive_link::AlwaysConnected;
//! use hive_sim::{BrainBuilder, NoopObserver};
//!
//! let mut brain = BrainBuilder::new(HiveConfig::default(), world, sink, AlwaysConnected).build()?;
//! let stop = brain.stop_handle();
//! brain.run(&mut NoopObserver)?;
//! ```

pub mod brain;
pub mod builder;
pub mod control;
pub mod error;
pub mod observer;
pub mod snapshot;
pub mod world;

#[cfg(test)]
mod tests;

pub use brain::Brain;
pub use builder::BrainBuilder;
pub use control::{BrainState, StopHandle};
pub use error::{BrainError, BrainResult};
pub use observer::{AppliedDecision, BrainObserver, NoopObserver, TickReport};
pub use snapshot::{AgentCounters, OverrideCounts, SourceCounts, TelemetrySnapshot};
pub use world::{ActionSink, DecisionDetails, DiscardSink, Observation, WorldView};
