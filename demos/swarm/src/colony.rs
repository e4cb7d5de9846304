//! Synthetic colony: drifting needs, random raids and flaky links.
//!
//! The colony is the game adapter for the demo.  [`Colony`] is the read side,
//! [`Orders`] the write side; applied intents travel over a channel and are
//! folded back into needs on the next refresh.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use log::{debug, info};

use hive_agent::{AgentSituation, NeedKind, Needs, Perception, Personality, ThreatLevel};
use hive_core::{AgentId, AgentRng, Intent, Millis, Role};
use hive_link::{ConnectionStatus, Connector, LinkError, LinkResult};
use hive_sim::{ActionSink, BrainError, BrainResult, DecisionDetails, Observation, WorldView};

/// Chance per refresh that a raid starts against one resident.
const RAID_CHANCE: f64 = 0.02;
/// Chance per resident per refresh that its link drops.
const DROP_CHANCE: f64 = 0.005;
const LOW_FOOD_TAG: &str = "FOOD_STOCK_LOW";

struct Resident {
    situation: AgentSituation,
    perception: Perception,
    personality: Personality,
    rng: AgentRng,
    /// Ticks left on an active raid.
    raid: u32,
}

impl Resident {
    fn new(agent: AgentId, seed: u64) -> Self {
        let mut rng = AgentRng::new(seed, agent);
        let role = Role::ALL[agent.0 as usize % Role::ALL.len()];
        let needs = Needs::new(
            rng.gen_range(10.0..50.0),
            rng.gen_range(10.0..50.0),
            rng.gen_range(0.0..20.0),
            rng.gen_range(10.0..50.0),
        );
        let personality = Personality::new(rng.random(), rng.random(), rng.random());
        Self {
            situation: AgentSituation::new(agent, role).with_needs(needs),
            perception: Perception::default(),
            personality,
            rng,
            raid: 0,
        }
    }

    fn drift(&mut self) {
        self.perception.events.clear();
        let needs = &mut self.situation.needs;
        needs.adjust(NeedKind::Hunger, self.rng.gen_range(0.5..3.0));
        needs.adjust(NeedKind::Energy, self.rng.gen_range(0.5..2.5));
        needs.adjust(NeedKind::Social, self.rng.gen_range(0.0..2.0));

        if self.raid > 0 {
            self.raid -= 1;
            needs.adjust(NeedKind::Safety, 12.0);
            self.perception.hostiles_nearby = 2;
            self.perception.health = (self.perception.health - 4.0).max(5.0);
        } else {
            needs.adjust(NeedKind::Safety, -5.0);
            self.perception.hostiles_nearby = 0;
            self.perception.health = (self.perception.health + 1.0).min(100.0);
        }

        let threat = match self.raid {
            0     => ThreatLevel::None,
            1..=2 => ThreatLevel::Medium,
            _     => ThreatLevel::High,
        };
        self.situation.threat = threat;
        self.perception.threat = threat;

        if self.situation.needs.hunger() > 70.0 {
            self.situation.tags.insert(LOW_FOOD_TAG.to_owned());
        } else {
            self.situation.tags.remove(LOW_FOOD_TAG);
        }
    }

    fn apply(&mut self, intent: Intent) {
        let needs = &mut self.situation.needs;
        match intent {
            Intent::Eat          => needs.adjust(NeedKind::Hunger, -35.0),
            Intent::Sleep        => needs.adjust(NeedKind::Energy, -40.0),
            Intent::Rest         => needs.adjust(NeedKind::Energy, -15.0),
            Intent::Socialize    => needs.adjust(NeedKind::Social, -30.0),
            Intent::SeekHealing  => self.perception.health = (self.perception.health + 25.0).min(100.0),
            Intent::FleeToSafety => needs.adjust(NeedKind::Safety, -25.0),
            Intent::Defend => {
                needs.adjust(NeedKind::Safety, -15.0);
                self.raid = self.raid.saturating_sub(2);
            }
            Intent::Idle => {}
            _ => {
                needs.adjust(NeedKind::Hunger, 1.5);
                needs.adjust(NeedKind::Energy, 1.5);
            }
        }
    }
}

/// Read side of the synthetic colony.
pub struct Colony {
    residents: Vec<Resident>,
    orders: Receiver<(AgentId, Intent)>,
    links: Arc<[AtomicBool]>,
    rng: AgentRng,
    applied: u64,
}

impl Colony {
    /// A colony of `size` residents plus the matching sink and connector.
    pub fn new(size: u32, seed: u64) -> (Self, Orders, FlakyLinks) {
        let (tx, rx) = channel();
        let links: Arc<[AtomicBool]> = (0..size).map(|_| AtomicBool::new(true)).collect();
        let colony = Self {
            residents: (0..size).map(|i| Resident::new(AgentId(i), seed)).collect(),
            orders: rx,
            links: Arc::clone(&links),
            rng: AgentRng::new(seed, AgentId(u32::MAX)),
            applied: 0,
        };
        let connector = FlakyLinks { links, rng: AgentRng::new(seed ^ 0x5eed, AgentId(u32::MAX)) };
        (colony, Orders { tx }, connector)
    }

    /// Intents folded back into needs so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn average_needs(&self) -> [f32; 4] {
        let n = self.residents.len().max(1) as f32;
        let mut sum = [0.0f32; 4];
        for r in &self.residents {
            let needs = &r.situation.needs;
            sum[0] += needs.hunger();
            sum[1] += needs.energy();
            sum[2] += needs.safety();
            sum[3] += needs.social();
        }
        sum.map(|s| s / n)
    }
}

impl WorldView for Colony {
    fn refresh(&mut self, _now: Millis) {
        while let Ok((agent, intent)) = self.orders.try_recv() {
            if let Some(r) = self.residents.get_mut(agent.0 as usize) {
                r.apply(intent);
                self.applied += 1;
            }
        }

        for r in &mut self.residents {
            r.drift();
        }

        if !self.residents.is_empty() && self.rng.gen_bool(RAID_CHANCE) {
            let target = self.rng.gen_range(0..self.residents.len());
            let r = &mut self.residents[target];
            r.raid = 4;
            r.perception.events.push("ATTACKED".to_owned());
            info!("raid on {}", r.situation.agent);
        }

        for link in self.links.iter() {
            if self.rng.gen_bool(DROP_CHANCE) && link.swap(false, Ordering::Relaxed) {
                debug!("link dropped");
            }
        }
    }

    fn live_agents(&self) -> Vec<AgentId> {
        self.residents.iter().map(|r| r.situation.agent).collect()
    }

    fn observe(&self, agent: AgentId) -> Option<Observation> {
        let r = self.residents.get(agent.0 as usize)?;
        Some(Observation::new(r.situation.clone()).with_perception(r.perception.clone()))
    }

    fn personality(&self, agent: AgentId) -> Personality {
        self.residents
            .get(agent.0 as usize)
            .map(|r| r.personality)
            .unwrap_or_default()
    }
}

/// Write side: forwards every applied intent to the colony.
pub struct Orders {
    tx: Sender<(AgentId, Intent)>,
}

impl ActionSink for Orders {
    fn apply_decision(&mut self, agent: AgentId, intent: Intent, details: &DecisionDetails) -> BrainResult<()> {
        if let Some(target) = details.target {
            debug!("{agent} heads to ({}, {}, {}) to {intent}", target.x, target.y, target.z);
        }
        self.tx.send((agent, intent)).map_err(|_| BrainError::Sink {
            agent,
            reason: "colony has shut down".into(),
        })
    }
}

/// Connector whose links drop at random and come back on a coin flip.
pub struct FlakyLinks {
    links: Arc<[AtomicBool]>,
    rng: AgentRng,
}

impl Connector for FlakyLinks {
    fn status(&self, agent: AgentId) -> ConnectionStatus {
        match self.links.get(agent.0 as usize) {
            Some(up) if up.load(Ordering::Relaxed) => ConnectionStatus::Connected,
            _ => ConnectionStatus::Disconnected,
        }
    }

    fn reconnect(&mut self, agent: AgentId) -> LinkResult<()> {
        let link = self.links.get(agent.0 as usize).ok_or(LinkError::UnknownAgent(agent))?;
        if self.rng.gen_bool(0.5) {
            link.store(true, Ordering::Relaxed);
            Ok(())
        } else {
            Err(LinkError::Refused(agent, "handshake rejected".into()))
        }
    }
}
