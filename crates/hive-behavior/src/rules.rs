//! Deterministic rule-based oracle.
//!
//! Precedence, first match wins:
//!
//! | # | Condition                               | Intent                  |
//! |---|-----------------------------------------|-------------------------|
//! | 1 | threat ≥ MEDIUM                         | role threat response    |
//! | 2 | hunger > 70                             | `EAT`                   |
//! | 3 | energy > 70                             | `SLEEP`                 |
//! | 4 | adult and not tagged `NIGHT`            | role work intent        |
//! | 5 | social > 60                             | `SOCIALIZE`             |
//! | 6 | otherwise                               | `IDLE`                  |

use hive_agent::{AgentSituation, ThreatLevel};
use hive_core::{Intent, Millis};

use crate::{AggregateContext, Decision, DecisionOracle, DecisionSource};

/// Environment tag marking night-time; suppresses role work.
pub const NIGHT_TAG: &str = "NIGHT";

/// Thresholds of the rule table.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleTable {
    pub hunger: f32,
    pub energy: f32,
    pub social: f32,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self { hunger: 70.0, energy: 70.0, social: 60.0 }
    }
}

impl RuleTable {
    pub fn intent_for(&self, s: &AgentSituation) -> Intent {
        if s.threat >= ThreatLevel::Medium {
            return s.role.threat_response();
        }
        if s.needs.hunger() > self.hunger {
            return Intent::Eat;
        }
        if s.needs.energy() > self.energy {
            return Intent::Sleep;
        }
        if s.life_stage.works() && !s.has_tag(NIGHT_TAG) {
            return s.role.work_intent();
        }
        if s.needs.social() > self.social {
            return Intent::Socialize;
        }
        Intent::Idle
    }

    /// One decision per situation, all tagged `source`.
    pub fn decide_all(&self, batch: &[AgentSituation], source: DecisionSource) -> Vec<Decision> {
        batch
            .iter()
            .map(|s| Decision { agent: s.agent, intent: self.intent_for(s), source })
            .collect()
    }
}

/// Always available, bounded latency; the default oracle and the safety net
/// of every other one.
#[derive(Clone, Debug, Default)]
pub struct RuleBasedOracle {
    pub table: RuleTable,
}

impl RuleBasedOracle {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }
}

impl DecisionOracle for RuleBasedOracle {
    fn name(&self) -> &str {
        "rules"
    }

    fn decide(&mut self, batch: &[AgentSituation], _context: &[String], _now: Millis) -> Vec<Decision> {
        self.table.decide_all(batch, DecisionSource::Rules)
    }
}

// ── Advice ────────────────────────────────────────────────────────────────────

/// Colony-level priorities, most pressing first.  Never empty.
pub fn advise(ctx: &AggregateContext) -> Vec<String> {
    let mut out = Vec::new();
    let mut push = |s: &str| out.push(s.to_owned());

    if ctx.threatened > 0 {
        push("DEFEND_SETTLEMENT");
    }
    if ctx.tags.contains("FOOD_STOCK_LOW") || ctx.avg_hunger > 60.0 {
        push("GATHER_FOOD");
    }
    if ctx.tags.contains("SHELTER_LOW") {
        push("BUILD_SHELTER");
    }
    if ctx.tags.contains("MATERIALS_LOW") {
        push("GATHER_MATERIALS");
    }
    if ctx.avg_energy > 60.0 {
        push("REST_CYCLE");
    }
    if ctx.avg_social > 60.0 {
        push("HOLD_GATHERING");
    }
    if out.is_empty() {
        out.push("MAINTAIN_ROUTINE".to_owned());
    }
    out
}
