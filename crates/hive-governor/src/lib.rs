//! `hive-governor`: resource telemetry and the resource governor.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                     |
//! |---------------|--------------------------------------------------------------|
//! | [`probe`]     | `ResourceProbe` trait, `ProcProbe` (Linux), `ManualProbe`    |
//! | [`telemetry`] | `Telemetry` sampler, `TelemetryReading`                      |
//! | [`health`]    | `HealthStatus`, `OperatingMode`, `Throttle`, `ResourceHealth`|
//! | [`governor`]  | `Governor`, `GovernorAction`, `GovernorReport`               |
//! | [`error`]     | `GovernorError`, `GovernorResult<T>`                         |
//!
//! Telemetry only measures; the governor only decides.  Carrying out the
//! decisions (evicting the cache, compacting minds) is the scheduler's job,
//! driven by the [`GovernorAction`]s in each report.

pub mod error;
pub mod governor;
pub mod health;
pub mod probe;
pub mod telemetry;


pub use error::{GovernorError, GovernorResult};
pub use governor::{Governor, GovernorAction, GovernorReport};
pub use health::{HealthStatus, OperatingMode, ResourceHealth, Throttle};
pub use probe::{parse_mem_total, parse_proc_stat, CpuCounters, ManualProbe, ProcProbe, ResourceProbe};
pub use telemetry::{Telemetry, TelemetryReading};
