//! Decision adaptation: post-process a proposed intent against the agent's
//! needs and recent history.
//!
//! Rules, in order; the first that fires wins:
//!
//! 1. **Need override.**  safety > `emergency_safety`, hunger >
//!    `emergency_hunger` or energy > `emergency_energy` forces the matching
//!    self-preserving intent, whatever was proposed.
//! 2. **Stuck loop.**  If at least `stuck_threshold` of the last
//!    `stuck_window` recorded intents equal the proposal, and the proposal is
//!    not in `allowed_repeats`, a role alternate different from the proposal
//!    is substituted.
//! 3. **Personality nudge.**  With probability [`nudge_probability`], a
//!    sociable agent switches to `SOCIALIZE` or a curious one to `EXPLORE`.
//!    Never overrides a self-preserving intent.
//!
//! Rules 2 and 3 never touch a protected intent: `FLEE_TO_SAFETY`,
//! `SEEK_HEALING`, or the role's threat response while threat is MEDIUM or
//! higher. Threat can raise urgency but never lowers it.

use serde::Serialize;

use hive_agent::{AgentSituation, DecisionHistory, Personality, ThreatLevel};
use hive_core::{AgentRng, DecisionConfig, Intent, NudgeConfig};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdaptReason {
    Unchanged,
    NeedOverride,
    StuckLoop,
    Nudge,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Adaptation {
    pub intent: Intent,
    pub reason: AdaptReason,
}

impl Adaptation {
    #[inline]
    pub fn changed(&self) -> bool {
        self.reason != AdaptReason::Unchanged
    }
}

/// Probability of a personality nudge for trait value `trait_value` and
/// need pressure `pressure` (both in `[0, 1]`).
///
/// Zero below the trait floor or above the pressure ceiling; otherwise grows
/// linearly with the trait and shrinks linearly with pressure, topping out at
/// `max_probability`.
pub fn nudge_probability(cfg: &NudgeConfig, trait_value: f64, pressure: f64) -> f64 {
    if trait_value.is_nan() || pressure.is_nan() {
        return 0.0;
    }
    let t = trait_value.clamp(0.0, 1.0);
    let p = pressure.clamp(0.0, 1.0);
    if t < cfg.trait_floor || p > cfg.pressure_ceiling {
        return 0.0;
    }
    let strength = (t - cfg.trait_floor) / (1.0 - cfg.trait_floor);
    let calm = 1.0 - p / cfg.pressure_ceiling;
    (cfg.max_probability * strength * calm).clamp(0.0, cfg.max_probability)
}

/// Stateless apart from its tuning; per-agent state is the history and RNG
/// passed in.
#[derive(Clone, Debug)]
pub struct Adapter {
    cfg: DecisionConfig,
}

impl Adapter {
    pub fn new(cfg: DecisionConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.cfg
    }

    /// Rule 1 alone; also applied to held intents between re-decisions.
    pub fn emergency_override(&self, s: &AgentSituation) -> Option<Intent> {
        if s.needs.safety() > self.cfg.emergency_safety {
            return Some(if s.threat >= ThreatLevel::Medium {
                s.role.threat_response()
            } else {
                Intent::FleeToSafety
            });
        }
        if s.needs.hunger() > self.cfg.emergency_hunger {
            return Some(Intent::Eat);
        }
        if s.needs.energy() > self.cfg.emergency_energy {
            return Some(Intent::Sleep);
        }
        None
    }

    /// Intents that repetition breaking and nudges leave alone.
    pub fn is_protected(situation: &AgentSituation, intent: Intent) -> bool {
        matches!(intent, Intent::FleeToSafety | Intent::SeekHealing)
            || (situation.threat >= ThreatLevel::Medium && intent == situation.role.threat_response())
    }

    /// `intent` dominates the recent history and is not an allowed repeat.
    pub fn is_stuck(&self, intent: Intent, history: &DecisionHistory) -> bool {
        !self.cfg.allowed_repeats.contains(&intent)
            && history.count_recent(self.cfg.stuck_window, intent) >= self.cfg.stuck_threshold
    }

    pub fn adapt(
        &self,
        situation:   &AgentSituation,
        personality: &Personality,
        proposed:    Intent,
        history:     &DecisionHistory,
        rng:         &mut AgentRng,
    ) -> Adaptation {
        if let Some(intent) = self.emergency_override(situation) {
            let reason = if intent == proposed { AdaptReason::Unchanged } else { AdaptReason::NeedOverride };
            return Adaptation { intent, reason };
        }

        if Self::is_protected(situation, proposed) {
            return Adaptation { intent: proposed, reason: AdaptReason::Unchanged };
        }

        if self.is_stuck(proposed, history) {
            let alternates: Vec<Intent> = situation
                .role
                .alternates()
                .iter()
                .copied()
                .filter(|a| *a != proposed)
                .collect();
            let intent = rng.choose(&alternates).copied().unwrap_or(if proposed == Intent::Idle {
                Intent::Rest
            } else {
                Intent::Idle
            });
            return Adaptation { intent, reason: AdaptReason::StuckLoop };
        }

        if !proposed.is_self_preserving() {
            if let Some(intent) = self.nudge(situation, personality, proposed, history, rng) {
                return Adaptation { intent, reason: AdaptReason::Nudge };
            }
        }

        Adaptation { intent: proposed, reason: AdaptReason::Unchanged }
    }

    fn nudge(
        &self,
        situation:   &AgentSituation,
        personality: &Personality,
        proposed:    Intent,
        history:     &DecisionHistory,
        rng:         &mut AgentRng,
    ) -> Option<Intent> {
        let pressure = situation.needs.pressure();
        let p_social = nudge_probability(&self.cfg.nudge, personality.sociability, pressure);
        let p_explore = nudge_probability(&self.cfg.nudge, personality.curiosity, pressure);
        if p_social + p_explore <= 0.0 {
            return None;
        }

        let roll: f64 = rng.random();
        let target = if roll < p_social {
            Intent::Socialize
        } else if roll < p_social + p_explore {
            Intent::Explore
        } else {
            return None;
        };
        (target != proposed && !self.is_stuck(target, history)).then_some(target)
    }
}
