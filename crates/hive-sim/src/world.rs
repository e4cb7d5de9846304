//! The two excluded layers the scheduler talks to: the world it reads and
//! the action sink it writes to.

use hive_agent::{AgentSituation, Location, Perception, Personality};
use hive_behavior::{AdaptReason, DecisionSource};
use hive_core::{AgentId, Intent, Millis, Tick};

use crate::BrainResult;

/// One agent's view of the world for one tick.
#[derive(Clone, Debug)]
pub struct Observation {
    pub situation: AgentSituation,
    pub perception: Perception,
}

impl Observation {
    pub fn new(situation: AgentSituation) -> Self {
        Self { situation, perception: Perception::default() }
    }

    pub fn with_perception(mut self, perception: Perception) -> Self {
        self.perception = perception;
        self
    }
}

/// Read side of the game adapter.
///
/// The scheduler calls [`refresh`][Self::refresh] once at the top of every
/// tick and then only reads.  No agent sees another agent's in-flight
/// decision: everything observed comes from the previous tick's committed
/// state.
pub trait WorldView {
    /// Pull the latest committed world state.
    fn refresh(&mut self, _now: Millis) {}

    /// Agents currently alive.  Order does not matter; the scheduler sorts.
    fn live_agents(&self) -> Vec<AgentId>;

    /// `None` if the agent vanished between `live_agents` and now.
    fn observe(&self, agent: AgentId) -> Option<Observation>;

    /// Personality used when the scheduler first meets an agent.
    fn personality(&self, _agent: AgentId) -> Personality {
        Personality::default()
    }
}

/// Extra information handed to the sink with each decision.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DecisionDetails {
    pub tick: Tick,
    pub source: DecisionSource,
    pub reason: AdaptReason,
    /// Target of the agent's assigned task, when the final intent continues it.
    pub target: Option<Location>,
}

/// Write side of the game adapter.
///
/// Fire-and-forget from the scheduler's point of view: an error is logged
/// and counted, never retried, and never stops the tick.
pub trait ActionSink {
    fn apply_decision(&mut self, agent: AgentId, intent: Intent, details: &DecisionDetails) -> BrainResult<()>;
}

/// Sink that drops every decision.
#[derive(Debug, Default)]
pub struct DiscardSink;

impl ActionSink for DiscardSink {
    fn apply_decision(&mut self, _agent: AgentId, _intent: Intent, _details: &DecisionDetails) -> BrainResult<()> {
        Ok(())
    }
}
