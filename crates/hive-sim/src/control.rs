//! Scheduler state machine and the stop handle.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use log::info;
use serde::Serialize;

/// `IDLE → TICKING → STOPPED`.  STOPPED is terminal.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum BrainState {
    Idle = 0,
    Ticking = 1,
    Stopped = 2,
}

impl BrainState {
    fn from_u8(raw: u8) -> BrainState {
        match raw {
            0 => BrainState::Idle,
            1 => BrainState::Ticking,
            _ => BrainState::Stopped,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BrainState::Idle    => "IDLE",
            BrainState::Ticking => "TICKING",
            BrainState::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for BrainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloneable handle on the scheduler's state.
///
/// [`stop`][Self::stop] may be called from any thread, including from inside
/// an observer callback.  A tick already in progress finishes; no further
/// tick begins.
#[derive(Clone, Debug)]
pub struct StopHandle {
    state: Arc<AtomicU8>,
}

impl StopHandle {
    pub(crate) fn new() -> Self {
        Self { state: Arc::new(AtomicU8::new(BrainState::Idle as u8)) }
    }

    pub fn state(&self) -> BrainState {
        BrainState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == BrainState::Stopped
    }

    /// Idempotent.
    pub fn stop(&self) {
        let previous = BrainState::from_u8(self.state.swap(BrainState::Stopped as u8, Ordering::AcqRel));
        if previous != BrainState::Stopped {
            info!("scheduler {previous} -> STOPPED");
        }
    }

    /// `IDLE → TICKING`.  Returns the state found if the transition was not
    /// possible.
    pub(crate) fn begin(&self) -> Result<(), BrainState> {
        self.state
            .compare_exchange(
                BrainState::Idle as u8,
                BrainState::Ticking as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| info!("scheduler IDLE -> TICKING"))
            .map_err(BrainState::from_u8)
    }
}
