//! Thoughts and the per-agent priority queue.

use std::cmp::Reverse;

use serde::Serialize;

use hive_core::{AgentId, Intent, Millis};

/// Urgency rank; lower = more urgent.  `Ord` follows declaration order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical = 0,
    Urgent   = 1,
    High     = 2,
    Normal   = 3,
    Idle     = 4,
}

impl Priority {
    /// Decisions at this rank are worth an oracle call; anything more urgent
    /// is handled by reflex.
    #[inline]
    pub fn is_deliberative(self) -> bool {
        matches!(self, Priority::Normal | Priority::Idle)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThoughtCategory {
    Survival,
    Need,
    Task,
    Opportunity,
    Work,
    Rest,
}

/// A world position, in block coordinates.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// One candidate course of action held by a Mind.
#[derive(Clone, Debug, PartialEq)]
pub struct Thought {
    pub agent: AgentId,
    pub priority: Priority,
    pub category: ThoughtCategory,
    pub intent: Option<Intent>,
    pub target: Option<Location>,
    pub created_at: Millis,
    pub expires_at: Option<Millis>,
    /// Regenerated from state on every update (as opposed to tasks and
    /// externally injected thoughts).
    pub derived: bool,
}

impl Thought {
    pub fn new(agent: AgentId, priority: Priority, category: ThoughtCategory, created_at: Millis) -> Self {
        Self {
            agent,
            priority,
            category,
            intent: None,
            target: None,
            created_at,
            expires_at: None,
            derived: false,
        }
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn with_target(mut self, target: Location) -> Self {
        self.target = Some(target);
        self
    }

    pub fn expiring_at(mut self, at: Millis) -> Self {
        self.expires_at = Some(at);
        self
    }

    #[inline]
    pub fn is_expired(&self, now: Millis) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    #[inline]
    fn rank(&self) -> (Priority, Millis) {
        (self.priority, self.created_at)
    }
}

/// Bounded priority queue of one agent's thoughts.
///
/// Sorted lazily: [`top`](Self::top) purges expired thoughts and sorts by
/// `(priority, created_at)` before reading.  When full, inserting drops the
/// least important thought, oldest first among equals.
#[derive(Clone, Debug)]
pub struct ThoughtQueue {
    thoughts: Vec<Thought>,
    capacity: usize,
}

impl ThoughtQueue {
    pub fn new(capacity: usize) -> Self {
        Self { thoughts: Vec::new(), capacity: capacity.max(1) }
    }

    pub fn len(&self) -> usize {
        self.thoughts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thoughts.is_empty()
    }

    pub fn push(&mut self, thought: Thought) {
        self.thoughts.push(thought);
        if self.thoughts.len() > self.capacity {
            self.drop_least_important();
        }
    }

    fn drop_least_important(&mut self) {
        let victim = self
            .thoughts
            .iter()
            .enumerate()
            .max_by_key(|(_, t)| (t.priority, Reverse(t.created_at)))
            .map(|(i, _)| i);
        if let Some(i) = victim {
            self.thoughts.remove(i);
        }
    }

    /// Remove expired thoughts; returns how many were dropped.
    pub fn purge_expired(&mut self, now: Millis) -> usize {
        let before = self.thoughts.len();
        self.thoughts.retain(|t| !t.is_expired(now));
        before - self.thoughts.len()
    }

    /// Remove every thought matching `pred`.
    pub fn remove_where(&mut self, pred: impl Fn(&Thought) -> bool) {
        self.thoughts.retain(|t| !pred(t));
    }

    /// Stable sort: ties keep insertion order after creation time.
    pub fn sort(&mut self) {
        self.thoughts.sort_by_key(Thought::rank);
    }

    /// Purge, sort, and return the most urgent live thought.
    pub fn top(&mut self, now: Millis) -> Option<&Thought> {
        self.purge_expired(now);
        self.sort();
        self.thoughts.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Thought> {
        self.thoughts.iter()
    }

    /// Release spare capacity.
    pub fn shrink(&mut self) {
        self.thoughts.shrink_to_fit();
    }
}
