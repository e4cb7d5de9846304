//! The per-agent Mind: state updates in, one intent out.
//!
//! # Escalation rules
//!
//! Every state or perception update regenerates the Mind's *derived*
//! thoughts, in strict precedence:
//!
//! | Rule | Trigger                                            | Priority |
//! |------|----------------------------------------------------|----------|
//! | 1    | on fire, drowning, HIGH threat, health ≤ critical  | CRITICAL |
//! | 2    | MEDIUM threat, safety/hunger/energy > ceiling      | URGENT   |
//! | 3    | assigned task                                      | HIGH     |
//! | 4    | role work, curiosity, sociability                  | NORMAL   |
//! | 5    | rest / role idle                                   | IDLE     |
//!
//! Task thoughts (rule 3) and externally injected thoughts survive
//! regeneration; derived ones are replaced and expire after the thought TTL
//! if updates stop arriving.
//!
//! Threat only ever escalates urgency: a higher threat level never produces
//! a less urgent top thought.
//!
//! # Re-decision interval
//!
//! [`Mind::think`] decides at most once per `min_redecision`.  Calls inside
//! that window return the held intent unchanged with `fresh == false`.

use std::collections::VecDeque;
use std::time::Duration;

use hive_core::{AgentId, DecisionConfig, Intent, Millis, Role};

use crate::{
    AgentSituation, Location, Perception, Personality, Priority, Thought,
    ThoughtCategory, ThoughtQueue, ThreatLevel,
};

/// Energy need above which an idle agent rests instead of loitering.
const REST_ENERGY: f32 = 50.0;

// ── Tuning ────────────────────────────────────────────────────────────────────

/// The subset of [`DecisionConfig`] a Mind reads.
#[derive(Clone, Debug, PartialEq)]
pub struct MindTuning {
    pub min_redecision: Duration,
    pub urgent_ceiling: f32,
    pub critical_health: f32,
    pub thought_ttl: Duration,
    pub thought_capacity: usize,
    pub memory_capacity: usize,
}

impl From<&DecisionConfig> for MindTuning {
    fn from(cfg: &DecisionConfig) -> Self {
        Self {
            min_redecision:   cfg.min_redecision(),
            urgent_ceiling:   cfg.urgent_ceiling,
            critical_health:  cfg.critical_health,
            thought_ttl:      cfg.thought_ttl(),
            thought_capacity: cfg.thought_capacity,
            memory_capacity:  cfg.memory_capacity,
        }
    }
}

impl Default for MindTuning {
    fn default() -> Self {
        Self::from(&DecisionConfig::default())
    }
}

// ── Verdict / memory ──────────────────────────────────────────────────────────

/// Output of [`Mind::think`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Verdict {
    pub intent: Intent,
    pub priority: Priority,
    /// `false` when the re-decision interval has not elapsed and the held
    /// intent was returned.
    pub fresh: bool,
}

impl Verdict {
    /// A fresh, non-urgent decision that is worth sending to the oracle.
    #[inline]
    pub fn needs_deliberation(&self) -> bool {
        self.fresh && self.priority.is_deliberative()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MemoryKind {
    Event(String),
    Decision(Intent),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemoryEntry {
    pub at: Millis,
    pub kind: MemoryKind,
}

#[derive(Clone, Debug)]
struct Task {
    intent: Intent,
    target: Option<Location>,
}

// ── Mind ──────────────────────────────────────────────────────────────────────

/// One agent's thought queue, memory, goals, and personality.
#[derive(Clone, Debug)]
pub struct Mind {
    agent: AgentId,
    role: Role,
    personality: Personality,
    situation: Option<AgentSituation>,
    perception: Perception,
    queue: ThoughtQueue,
    memory: VecDeque<MemoryEntry>,
    task: Option<Task>,
    held: Option<(Verdict, Millis)>,
    tuning: MindTuning,
}

impl Mind {
    pub fn new(agent: AgentId, role: Role, personality: Personality, tuning: MindTuning) -> Self {
        Self {
            agent,
            role,
            personality,
            situation: None,
            perception: Perception::default(),
            queue: ThoughtQueue::new(tuning.thought_capacity),
            memory: VecDeque::new(),
            task: None,
            held: None,
            tuning,
        }
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn situation(&self) -> Option<&AgentSituation> {
        self.situation.as_ref()
    }

    pub fn thoughts(&self) -> &ThoughtQueue {
        &self.queue
    }

    pub fn memory(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.memory.iter()
    }

    /// The intent currently held, if any decision has been made.
    pub fn held_intent(&self) -> Option<Intent> {
        self.held.map(|(v, _)| v.intent)
    }

    // ── Inputs ────────────────────────────────────────────────────────────

    pub fn update_state(&mut self, situation: AgentSituation, now: Millis) {
        self.ingest_situation(situation, now);
        self.reflect(now);
    }

    pub fn update_perception(&mut self, perception: Perception, now: Millis) {
        self.ingest_perception(perception, now);
        self.reflect(now);
    }

    /// Both updates with a single reflection pass.
    pub fn observe(&mut self, situation: AgentSituation, perception: Perception, now: Millis) {
        self.ingest_situation(situation, now);
        self.ingest_perception(perception, now);
        self.reflect(now);
    }

    fn ingest_situation(&mut self, situation: AgentSituation, now: Millis) {
        self.role = situation.role;
        let fresh_events: Vec<String> = situation
            .recent_events()
            .filter(|e| !self.remembers_event(e))
            .map(str::to_owned)
            .collect();
        for event in fresh_events {
            self.remember(now, MemoryKind::Event(event));
        }
        self.situation = Some(situation);
    }

    fn ingest_perception(&mut self, perception: Perception, now: Millis) {
        for event in &perception.events {
            self.remember(now, MemoryKind::Event(event.clone()));
        }
        self.perception = perception;
    }

    fn remembers_event(&self, event: &str) -> bool {
        self.memory
            .iter()
            .any(|m| matches!(&m.kind, MemoryKind::Event(e) if e == event))
    }

    fn remember(&mut self, at: Millis, kind: MemoryKind) {
        if self.memory.len() >= self.tuning.memory_capacity {
            self.memory.pop_front();
        }
        self.memory.push_back(MemoryEntry { at, kind });
    }

    /// Give the agent a task; it is pursued at HIGH priority until completed.
    pub fn assign_task(&mut self, intent: Intent, target: Option<Location>, now: Millis) {
        self.queue.remove_where(|t| t.category == ThoughtCategory::Task);
        let mut thought = Thought::new(self.agent, Priority::High, ThoughtCategory::Task, now).with_intent(intent);
        if let Some(target) = target {
            thought = thought.with_target(target);
        }
        self.queue.push(thought);
        self.task = Some(Task { intent, target });
    }

    pub fn complete_task(&mut self) {
        self.queue.remove_where(|t| t.category == ThoughtCategory::Task);
        self.task = None;
    }

    pub fn current_task(&self) -> Option<(Intent, Option<Location>)> {
        self.task.as_ref().map(|t| (t.intent, t.target))
    }

    // ── Reflection ────────────────────────────────────────────────────────

    /// Replace derived thoughts with the ones implied by current state.
    fn reflect(&mut self, now: Millis) {
        self.queue.remove_where(|t| t.derived);
        let expires = now + self.tuning.thought_ttl;
        let mut seen = Vec::new();
        for (priority, category, intent) in self.derive() {
            if seen.contains(&(category, intent)) {
                continue;
            }
            seen.push((category, intent));
            let mut thought = Thought::new(self.agent, priority, category, now)
                .with_intent(intent)
                .expiring_at(expires);
            thought.derived = true;
            self.queue.push(thought);
        }
    }

    fn derive(&self) -> Vec<(Priority, ThoughtCategory, Intent)> {
        use Priority::*;
        use ThoughtCategory::*;

        let mut out = Vec::new();
        let p = &self.perception;
        let situation = self.situation.as_ref();
        let threat = situation.map_or(ThreatLevel::None, |s| s.threat).max(p.threat);
        let ceiling = self.tuning.urgent_ceiling;

        // Rule 1: immediate life threat.
        if p.on_fire || p.drowning {
            out.push((Critical, Survival, Intent::FleeToSafety));
        }
        if threat == ThreatLevel::High {
            out.push((Critical, Survival, self.role.threat_response()));
        }
        if p.health() <= self.tuning.critical_health {
            out.push((Critical, Survival, Intent::SeekHealing));
        }

        // Rule 2: acute need breach.
        if threat == ThreatLevel::Medium {
            out.push((Urgent, Need, self.role.threat_response()));
        }
        if let Some(s) = situation {
            if s.needs.safety() > ceiling {
                out.push((Urgent, Need, Intent::FleeToSafety));
            }
            if s.needs.hunger() > ceiling {
                out.push((Urgent, Need, Intent::Eat));
            }
            if s.needs.energy() > ceiling {
                out.push((Urgent, Need, Intent::Sleep));
            }
        }

        // Rule 3 (tasks) lives in the queue as a non-derived thought.

        // Rule 4: role work and personality-driven opportunism.
        let works = situation.is_some_and(|s| s.life_stage.works()) && !p.is_night;
        let mut normal = Vec::new();
        if self.personality.is_curious() {
            normal.push((Normal, Opportunity, Intent::Explore));
        }
        if self.personality.is_sociable() {
            normal.push((Normal, Opportunity, Intent::Socialize));
        }
        if works {
            let work = (Normal, Work, self.role.work_intent());
            if self.personality.work_first() {
                normal.insert(0, work);
            } else {
                normal.push(work);
            }
        }
        out.extend(normal);

        // Rule 5: idle / rest.
        let tired = situation.is_some_and(|s| s.needs.energy() > REST_ENERGY);
        if tired || p.is_night {
            out.push((Idle, Rest, Intent::Rest));
        } else {
            out.push((Idle, Rest, self.role.idle_intent()));
        }

        out
    }

    // ── Decision ──────────────────────────────────────────────────────────

    /// Decide what to do now.
    pub fn think(&mut self, now: Millis) -> Verdict {
        if let Some((held, at)) = self.held {
            if now.since(at) < self.tuning.min_redecision {
                return Verdict { fresh: false, ..held };
            }
        }

        let (intent, priority) = match self.queue.top(now) {
            Some(t) => (t.intent.unwrap_or_else(|| self.role.idle_intent()), t.priority),
            None    => (self.role.idle_intent(), Priority::Idle),
        };
        let verdict = Verdict { intent, priority, fresh: true };
        self.held = Some((verdict, now));
        verdict
    }

    /// Replace the held intent with the final decision for this tick
    /// (after oracle and adaptation) without restarting the interval.
    pub fn commit(&mut self, intent: Intent, now: Millis) {
        match &mut self.held {
            Some((held, _)) => held.intent = intent,
            None => {
                let verdict = Verdict { intent, priority: Priority::Normal, fresh: true };
                self.held = Some((verdict, now));
            }
        }
        self.remember(now, MemoryKind::Decision(intent));
    }

    // ── Housekeeping ──────────────────────────────────────────────────────

    /// Release memory.  `aggressive` also halves the event memory.
    pub fn compact(&mut self, now: Millis, aggressive: bool) {
        self.queue.purge_expired(now);
        self.queue.shrink();
        if aggressive {
            let keep = self.memory.len() / 2;
            let drop = self.memory.len() - keep;
            self.memory.drain(..drop);
        }
        self.memory.shrink_to_fit();
    }
}
