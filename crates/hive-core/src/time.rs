//! Time model: tick counter, monotonic millisecond timestamps, and an
//! injectable clock.
//!
//! # Design
//!
//! The scheduler counts completed simulation steps with `Tick`, but every
//! time-based rule in the loop (re-decision interval, cache TTL, backoff,
//! self-healing cooldown) is measured in wall time.  Those rules read time
//! exclusively through the [`Clock`] trait:
//!
//! - [`SystemClock`]: production; `now()` is milliseconds since the clock
//!   was created, `sleep()` blocks the thread.
//! - [`ManualClock`]: tests and offline replays; `sleep()` advances virtual
//!   time instantly, so thousands of ticks run without wall-clock delay.
//!
//! `Millis` is an integer, so all interval arithmetic is exact and
//! comparisons are O(1).

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// Number of scheduler steps completed since `start()`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// The following tick.
    #[inline]
    pub fn next(self) -> Tick {
        Tick(self.0 + 1)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── Millis ───────────────────────────────────────────────────────────────────

/// A monotonic timestamp in milliseconds, relative to the owning clock's
/// origin.  Only comparable with timestamps from the same clock.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    /// Time elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Millis) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0
    }
}

impl std::ops::Add<Duration> for Millis {
    type Output = Millis;
    #[inline]
    fn add(self, rhs: Duration) -> Millis {
        Millis(self.0.saturating_add(duration_ms(rhs)))
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// `Duration` → whole milliseconds, saturating at `u64::MAX`.
#[inline]
pub fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ── Clock ────────────────────────────────────────────────────────────────────

/// Source of time for every component in the loop.
///
/// Implementations must be monotonic: `now()` never goes backwards.
pub trait Clock: Send + Sync + 'static {
    /// Current timestamp.
    fn now(&self) -> Millis;

    /// Block (or pretend to block) for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        Millis(duration_ms(self.origin.elapsed()))
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Virtual clock for tests.  Clones share the same time, so a test can keep
/// one handle and give another to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock starting at `Millis(0)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock starting at `start`.
    pub fn starting_at(start: Millis) -> Self {
        Self { now_ms: Arc::new(AtomicU64::new(start.0)) }
    }

    /// Move time forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.now_ms.fetch_add(duration_ms(duration), Ordering::SeqCst);
    }

    /// Jump to `at`; ignored if `at` is in the past.
    pub fn set(&self, at: Millis) {
        self.now_ms.fetch_max(at.0, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        Millis(self.now_ms.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
