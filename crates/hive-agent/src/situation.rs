//! Per-tick agent snapshot: needs, threat, tags, and raw perception.
//!
//! An [`AgentSituation`] is rebuilt by the world adapter every tick and is
//! never kept across ticks by the loop.  Need values are clamped to
//! `[0, 100]` on every write path, so no consumer ever sees an out-of-range
//! need.

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;

use hive_core::{AgentId, Role};

/// Recent event tags kept per situation.
pub const MAX_RECENT_EVENTS: usize = 8;

/// Upper bound of every need value.
pub const NEED_MAX: f32 = 100.0;

/// Clamp a raw need reading into `[0, 100]`.  NaN reads as 0.
#[inline]
pub fn clamp_need(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, NEED_MAX) }
}

// ── Enums ─────────────────────────────────────────────────────────────────────

/// Ordinal danger level around the agent.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifeStage {
    Child,
    #[default]
    Adult,
    Elder,
}

impl LifeStage {
    /// Children and elders are not expected to do role work.
    #[inline]
    pub fn works(self) -> bool {
        matches!(self, LifeStage::Adult)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mood {
    #[default]
    Content,
    Happy,
    Anxious,
    Frightened,
    Bored,
    Lonely,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum NeedKind {
    Hunger,
    Energy,
    Safety,
    Social,
}

// ── Needs ─────────────────────────────────────────────────────────────────────

/// Need pressures; `0` = fully satisfied, `100` = desperate.
///
/// `energy` is the need for sleep: 100 means exhausted.  Fields are private
/// so the `[0, 100]` invariant cannot be bypassed.
#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize)]
pub struct Needs {
    hunger: f32,
    energy: f32,
    safety: f32,
    social: f32,
}

impl Needs {
    pub fn new(hunger: f32, energy: f32, safety: f32, social: f32) -> Self {
        Self {
            hunger: clamp_need(hunger),
            energy: clamp_need(energy),
            safety: clamp_need(safety),
            social: clamp_need(social),
        }
    }

    #[inline]
    pub fn hunger(&self) -> f32 {
        self.hunger
    }

    #[inline]
    pub fn energy(&self) -> f32 {
        self.energy
    }

    #[inline]
    pub fn safety(&self) -> f32 {
        self.safety
    }

    #[inline]
    pub fn social(&self) -> f32 {
        self.social
    }

    pub fn get(&self, kind: NeedKind) -> f32 {
        match kind {
            NeedKind::Hunger => self.hunger,
            NeedKind::Energy => self.energy,
            NeedKind::Safety => self.safety,
            NeedKind::Social => self.social,
        }
    }

    pub fn set(&mut self, kind: NeedKind, value: f32) {
        let slot = match kind {
            NeedKind::Hunger => &mut self.hunger,
            NeedKind::Energy => &mut self.energy,
            NeedKind::Safety => &mut self.safety,
            NeedKind::Social => &mut self.social,
        };
        *slot = clamp_need(value);
    }

    /// Add `delta` (may be negative) and clamp.
    pub fn adjust(&mut self, kind: NeedKind, delta: f32) {
        self.set(kind, self.get(kind) + delta);
    }

    /// Bodily pressure in `[0, 1]`: the worst of hunger, energy, and safety.
    pub fn pressure(&self) -> f64 {
        f64::from(self.hunger.max(self.energy).max(self.safety)) / f64::from(NEED_MAX)
    }
}

// ── AgentSituation ────────────────────────────────────────────────────────────

/// Everything the loop needs to know about one agent for one tick.
#[derive(Clone, Debug, Serialize)]
pub struct AgentSituation {
    pub agent: AgentId,
    pub role: Role,
    pub life_stage: LifeStage,
    pub needs: Needs,
    pub mood: Mood,
    pub threat: ThreatLevel,
    /// Small set of environment tags such as `FOOD_STOCK_LOW`.
    pub tags: BTreeSet<String>,
    recent_events: VecDeque<String>,
}

impl AgentSituation {
    pub fn new(agent: AgentId, role: Role) -> Self {
        Self {
            agent,
            role,
            life_stage: LifeStage::default(),
            needs: Needs::default(),
            mood: Mood::default(),
            threat: ThreatLevel::default(),
            tags: BTreeSet::new(),
            recent_events: VecDeque::new(),
        }
    }

    pub fn with_needs(mut self, needs: Needs) -> Self {
        self.needs = needs;
        self
    }

    pub fn with_threat(mut self, threat: ThreatLevel) -> Self {
        self.threat = threat;
        self
    }

    pub fn with_life_stage(mut self, stage: LifeStage) -> Self {
        self.life_stage = stage;
        self
    }

    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = mood;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Append an event tag, evicting the oldest beyond [`MAX_RECENT_EVENTS`].
    pub fn push_event(&mut self, event: impl Into<String>) {
        if self.recent_events.len() == MAX_RECENT_EVENTS {
            self.recent_events.pop_front();
        }
        self.recent_events.push_back(event.into());
    }

    /// Oldest first.
    pub fn recent_events(&self) -> impl Iterator<Item = &str> {
        self.recent_events.iter().map(String::as_str)
    }

    /// Raise the threat level; never lowers it.
    pub fn escalate_threat(&mut self, observed: ThreatLevel) {
        self.threat = self.threat.max(observed);
    }
}

// ── Perception ────────────────────────────────────────────────────────────────

/// Raw sensory input from the game adapter.
#[derive(Clone, Debug, PartialEq)]
pub struct Perception {
    /// `0` = dead, `100` = full health.
    pub health: f32,
    pub on_fire: bool,
    pub drowning: bool,
    pub hostiles_nearby: u32,
    pub friends_nearby: u32,
    pub is_night: bool,
    pub threat: ThreatLevel,
    /// Notable events since the last perception (e.g. `"ATTACKED"`).
    pub events: Vec<String>,
}

impl Default for Perception {
    fn default() -> Self {
        Self {
            health: NEED_MAX,
            on_fire: false,
            drowning: false,
            hostiles_nearby: 0,
            friends_nearby: 0,
            is_night: false,
            threat: ThreatLevel::None,
            events: Vec::new(),
        }
    }
}

impl Perception {
    /// Health clamped to `[0, 100]`.
    #[inline]
    pub fn health(&self) -> f32 {
        clamp_need(self.health)
    }
}
