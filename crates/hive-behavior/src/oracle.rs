//! The `DecisionOracle` trait and the types that cross it.

use std::collections::BTreeSet;

use serde::Serialize;

use hive_agent::{AgentSituation, ThreatLevel};
use hive_core::{AgentId, Intent, Millis};

// ── DecisionSource ────────────────────────────────────────────────────────────

/// Where an agent's final intent for a tick came from.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionSource {
    /// Model-backed oracle answered.
    Oracle,
    /// Rule table as the primary oracle.
    Rules,
    /// Rule table standing in after an oracle failure.
    Fallback,
    /// Fresh decision-cache hit; no oracle call.
    Cache,
    /// Reflex decision from the agent's own Mind (urgent thought, or the
    /// batch was full).
    Mind,
    /// Inside the re-decision interval; previous intent kept.
    Held,
}

impl DecisionSource {
    pub const ALL: [DecisionSource; 6] = [
        DecisionSource::Oracle,
        DecisionSource::Rules,
        DecisionSource::Fallback,
        DecisionSource::Cache,
        DecisionSource::Mind,
        DecisionSource::Held,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DecisionSource::Oracle   => "ORACLE",
            DecisionSource::Rules    => "RULES",
            DecisionSource::Fallback => "FALLBACK",
            DecisionSource::Cache    => "CACHE",
            DecisionSource::Mind     => "MIND",
            DecisionSource::Held     => "HELD",
        }
    }

    /// Results worth caching: a real answer, never a stand-in.
    #[inline]
    pub fn is_cacheable(self) -> bool {
        matches!(self, DecisionSource::Oracle | DecisionSource::Rules)
    }
}

/// One agent's answer from an oracle.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Decision {
    pub agent: AgentId,
    pub intent: Intent,
    pub source: DecisionSource,
}

// ── AggregateContext ──────────────────────────────────────────────────────────

/// Colony-wide summary fed to [`DecisionOracle::advise`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AggregateContext {
    pub population: usize,
    pub avg_hunger: f32,
    pub avg_energy: f32,
    pub avg_safety: f32,
    pub avg_social: f32,
    /// Agents at MEDIUM threat or above.
    pub threatened: usize,
    /// Union of every agent's environment tags.
    pub tags: BTreeSet<String>,
    pub built_at: Millis,
}

impl AggregateContext {
    pub fn from_situations<'a>(situations: impl IntoIterator<Item = &'a AgentSituation>, now: Millis) -> Self {
        let mut ctx = AggregateContext { built_at: now, ..Self::default() };
        let (mut hunger, mut energy, mut safety, mut social) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for s in situations {
            ctx.population += 1;
            hunger += f64::from(s.needs.hunger());
            energy += f64::from(s.needs.energy());
            safety += f64::from(s.needs.safety());
            social += f64::from(s.needs.social());
            if s.threat >= ThreatLevel::Medium {
                ctx.threatened += 1;
            }
            ctx.tags.extend(s.tags.iter().cloned());
        }
        if ctx.population > 0 {
            let n = ctx.population as f64;
            ctx.avg_hunger = (hunger / n) as f32;
            ctx.avg_energy = (energy / n) as f32;
            ctx.avg_safety = (safety / n) as f32;
            ctx.avg_social = (social / n) as f32;
        }
        ctx
    }
}

// ── OracleStats ───────────────────────────────────────────────────────────────

/// Counters exported with the telemetry snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OracleStats {
    pub calls: u64,
    pub fallbacks: u64,
    pub timeouts: u64,
    pub malformed: u64,
    pub avg_latency_ms: f64,
    pub available: bool,
}

// ── DecisionOracle ────────────────────────────────────────────────────────────

/// A pluggable decision source.
///
/// # Contract
///
/// [`decide`][Self::decide] returns exactly one [`Decision`] per input
/// situation, in input order, whatever happens downstream.  Implementations
/// that talk to something unreliable degrade to the rule table internally and
/// tag those answers [`DecisionSource::Fallback`]; they never return an error.
///
/// Oracles are called from the scheduler thread only, once per tick, so
/// `&mut self` is available for counters and availability caching.
pub trait DecisionOracle: Send + 'static {
    fn name(&self) -> &str;

    fn decide(&mut self, batch: &[AgentSituation], context: &[String], now: Millis) -> Vec<Decision>;

    /// Priority strings for the colony as a whole.
    ///
    /// Default: the rule table's advice.
    fn advise(&mut self, aggregate: &AggregateContext) -> Vec<String> {
        crate::rules::advise(aggregate)
    }

    /// Cached availability; implementations re-probe no more often than
    /// their recheck interval.
    fn is_available(&mut self, _now: Millis) -> bool {
        true
    }

    fn stats(&self) -> OracleStats {
        OracleStats { available: true, ..OracleStats::default() }
    }
}
