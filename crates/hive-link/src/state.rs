//! Per-agent reconnect backoff state.

use std::time::Duration;

use serde::Serialize;

use hive_core::{Millis, ReconnectConfig};

/// Backoff bookkeeping for one disconnected agent.
///
/// Created on the first failed attempt and deleted when the agent reconnects
/// or exhausts its attempt cap.  `attempts` never exceeds the cap.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BackoffState {
    /// Failed reconnect attempts so far.
    pub attempts: u32,

    /// Wait before the next attempt, measured from `last_attempt`.
    pub delay: Duration,

    pub last_attempt: Millis,
}

impl BackoffState {
    /// State after the first failure at `now`.
    pub fn after_first_failure(now: Millis, cfg: &ReconnectConfig) -> Self {
        Self { attempts: 1, delay: cfg.delay_after(1), last_attempt: now }
    }

    /// Record another failure at `now`, growing the delay.
    pub fn record_failure(&mut self, now: Millis, cfg: &ReconnectConfig) {
        self.attempts = self.attempts.saturating_add(1).min(cfg.max_attempts);
        self.delay = cfg.delay_after(self.attempts);
        self.last_attempt = now;
    }

    /// The delay since the last attempt has elapsed.
    #[inline]
    pub fn is_ready(&self, now: Millis) -> bool {
        now >= self.next_attempt_at()
    }

    #[inline]
    pub fn is_exhausted(&self, cfg: &ReconnectConfig) -> bool {
        self.attempts >= cfg.max_attempts
    }

    /// When the next attempt becomes allowed.
    #[inline]
    pub fn next_attempt_at(&self) -> Millis {
        self.last_attempt + self.delay
    }
}
