//! `hive-link`: connection watchdog with per-agent exponential backoff.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                    |
//! |----------------|-------------------------------------------------------------|
//! | [`connector`]  | `Connector` trait, `ConnectionStatus`, `AlwaysConnected`    |
//! | [`state`]      | `BackoffState`: attempts, delay, last attempt               |
//! | [`store`]      | `BackoffStore`: sparse backoff map + degraded set           |
//! | [`watchdog`]   | `Watchdog<C>`: `reconcile`, `reset`                         |
//! | [`error`]      | `LinkError`, `LinkResult<T>`                                |
//!
//! # Backoff model
//!
//! 1. The first time a live agent is seen disconnected it is retried at once.
//! 2. Each failure sets `delay = min(base × multiplier^(failures-1), max)`;
//!    the next attempt waits until `last_attempt + delay`.
//! 3. The failure that reaches `max_attempts` marks the agent degraded.  It
//!    is never retried again until [`Watchdog::reset`].
//! 4. A successful reconnect (by the watchdog or otherwise) deletes the
//!    agent's backoff state.

pub mod connector;
pub mod error;
pub mod state;
pub mod store;
pub mod watchdog;

#[cfg(test)]
mod tests;

pub use connector::{AlwaysConnected, ConnectionStatus, Connector};
pub use error::{LinkError, LinkResult};
pub use state::BackoffState;
pub use store::BackoffStore;
pub use watchdog::{ReconcileReport, Watchdog};
