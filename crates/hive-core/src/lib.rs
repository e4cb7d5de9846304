//! `hive-core`: foundational types for the `hive` agent governance loop.
//!
//! This crate is a dependency of every other `hive-*` crate.  It has no
//! `hive-*` dependencies and few external ones (`rand`, `thiserror`, `serde`,
//! `toml`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`                                             |
//! | [`time`]        | `Tick`, `Millis`, `Clock`, `SystemClock`, `ManualClock` |
//! | [`intent`]      | `Intent` closed vocabulary, `Role`                    |
//! | [`rng`]         | `AgentRng` (per-agent, seeded)                        |
//! | [`config`]      | `HiveConfig` and its sections                         |
//! | [`error`]       | `HiveError`, `HiveResult`                             |

pub mod config;
pub mod error;
pub mod ids;
pub mod intent;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{
    DecisionConfig, HiveConfig, NudgeConfig, OracleConfig, ReconnectConfig, ResourceConfig,
    TickConfig, MAX_HISTORY_LEN,
};
pub use error::{HiveError, HiveResult};
pub use ids::AgentId;
pub use intent::{Intent, Role};
pub use rng::AgentRng;
pub use time::{duration_ms, Clock, ManualClock, Millis, SystemClock, Tick};
