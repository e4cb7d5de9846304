//! `hive-agent`: per-agent state for the `hive` governance loop.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                  |
//! |-------------------|-----------------------------------------------------------|
//! | [`situation`]     | `AgentSituation`, `Needs`, `ThreatLevel`, `Perception`    |
//! | [`thought`]       | `Thought`, `Priority`, `ThoughtQueue`                     |
//! | [`personality`]   | `Personality` trait weights                               |
//! | [`mind`]          | `Mind` (thought generation and local decision), `Verdict` |
//! | [`history`]       | `DecisionHistory` bounded ring                            |
//!
//! Nothing here talks to an oracle or to the world; the loop in `hive-sim`
//! feeds situations in and reads verdicts out.

pub mod history;
pub mod mind;
pub mod personality;
pub mod situation;
pub mod thought;


pub use history::DecisionHistory;
pub use mind::{MemoryEntry, MemoryKind, Mind, MindTuning, Verdict};
pub use personality::{Personality, OPPORTUNISM_THRESHOLD};
pub use situation::{
    clamp_need, AgentSituation, LifeStage, Mood, NeedKind, Needs, Perception, ThreatLevel,
    MAX_RECENT_EVENTS, NEED_MAX,
};
pub use thought::{Location, Priority, Thought, ThoughtCategory, ThoughtQueue};
