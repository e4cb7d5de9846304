//! `hive-behavior`: decision oracles, the decision cache, and the adaptation
//! layer.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                         |
//! |-------------|------------------------------------------------------------------|
//! | [`oracle`]  | `DecisionOracle` trait, `Decision`, `DecisionSource`, `AggregateContext` |
//! | [`rules`]   | `RuleBasedOracle`, `RuleTable`, colony `advise`                  |
//! | [`model`]   | `ModelOracle`, `OracleTransport`, `HttpTransport` (feature `http`) |
//! | [`cache`]   | `DecisionCache`, `Fingerprint`                                   |
//! | [`client`]  | `OracleClient` (cache + oracle + panic isolation)                |
//! | [`adapt`]   | `Adapter`, `nudge_probability`                                   |
//! | [`error`]   | `OracleError`, `OracleResult<T>`                                 |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                      |
//! |-----------|-------------------------------------------------------------|
//! | `http`    | Enables `HttpTransport` (blocking `ureq` client)            |
//! | `fx-hash` | FxHash instead of SipHash for the cache's fingerprint map    |
//!
//! # Flow
//!
//! The scheduler hands a batch of situations to [`OracleClient::decide`],
//! which answers cache hits locally and sends the rest to the configured
//! oracle.  Every answer then passes through [`Adapter::adapt`] before it
//! is applied.  `OracleError` never escapes a `decide` call: it only shows up
//! in logs and in the fallback counters.

pub mod adapt;
pub mod cache;
pub mod client;
pub mod error;
pub mod model;
pub mod oracle;
pub mod rules;


pub use adapt::{nudge_probability, AdaptReason, Adaptation, Adapter};
pub use cache::{CacheStats, DecisionCache, Fingerprint, NEED_BUCKET};
pub use client::OracleClient;
pub use error::{OracleError, OracleResult};
#[cfg(feature = "http")]
pub use model::HttpTransport;
pub use model::{ModelOracle, OracleTransport};
pub use oracle::{AggregateContext, Decision, DecisionOracle, DecisionSource, OracleStats};
pub use rules::{advise, RuleBasedOracle, RuleTable, NIGHT_TAG};
