//! Integration tests for hive-sim.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use hive_agent::{AgentSituation, Location, Needs};
use hive_behavior::{
    AdaptReason, Decision, DecisionOracle, DecisionSource, ModelOracle, OracleResult,
    OracleTransport, RuleBasedOracle,
};
use hive_core::{AgentId, Clock, HiveConfig, Intent, ManualClock, Millis, OracleConfig, Role, Tick};
use hive_governor::{GovernorAction, HealthStatus, ManualProbe};
use hive_link::{ConnectionStatus, Connector, LinkError, LinkResult};

use crate::brain::rotate_window;
use crate::{
    ActionSink, Brain, BrainBuilder, BrainError, BrainObserver, BrainResult, BrainState,
    DecisionDetails, NoopObserver, Observation, StopHandle, TelemetrySnapshot, TickReport,
    WorldView,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn calm(id: u32, role: Role) -> AgentSituation {
    AgentSituation::new(AgentId(id), role).with_needs(Needs::new(10.0, 10.0, 0.0, 10.0))
}

#[derive(Default)]
struct ScriptedWorld {
    agents: BTreeMap<AgentId, Observation>,
    /// Listed as live but never observable.
    ghosts: Vec<AgentId>,
}

impl ScriptedWorld {
    fn of(situations: impl IntoIterator<Item = AgentSituation>) -> Self {
        let mut w = Self::default();
        for s in situations {
            w.agents.insert(s.agent, Observation::new(s));
        }
        w
    }

    fn set_needs(&mut self, agent: u32, needs: Needs) {
        if let Some(obs) = self.agents.get_mut(&AgentId(agent)) {
            obs.situation.needs = needs;
        }
    }
}

impl WorldView for ScriptedWorld {
    fn live_agents(&self) -> Vec<AgentId> {
        self.agents.keys().copied().chain(self.ghosts.iter().copied()).collect()
    }

    fn observe(&self, agent: AgentId) -> Option<Observation> {
        self.agents.get(&agent).cloned()
    }
}

#[derive(Default)]
struct RecordingSink {
    applied: Vec<(AgentId, Intent, DecisionDetails)>,
    reject: BTreeSet<AgentId>,
    panic_on: BTreeSet<AgentId>,
}

impl ActionSink for RecordingSink {
    fn apply_decision(&mut self, agent: AgentId, intent: Intent, details: &DecisionDetails) -> BrainResult<()> {
        if self.panic_on.contains(&agent) {
            panic!("sink exploded for {agent}");
        }
        if self.reject.contains(&agent) {
            return Err(BrainError::Sink { agent, reason: "bot offline".into() });
        }
        self.applied.push((agent, intent, *details));
        Ok(())
    }
}

/// Links for `down` agents are permanently refused.
#[derive(Default)]
struct DeadLinks {
    down: BTreeSet<AgentId>,
    attempts: u32,
}

impl Connector for DeadLinks {
    fn status(&self, agent: AgentId) -> ConnectionStatus {
        if self.down.contains(&agent) { ConnectionStatus::Disconnected } else { ConnectionStatus::Connected }
    }

    fn reconnect(&mut self, agent: AgentId) -> LinkResult<()> {
        self.attempts += 1;
        Err(LinkError::Refused(agent, "unreachable".into()))
    }
}

/// Oracle that answers `intent` for everyone and records each batch.
struct RecordingOracle {
    intent: Intent,
    batches: Arc<Mutex<Vec<Vec<AgentId>>>>,
}

impl RecordingOracle {
    fn new(intent: Intent) -> (Self, Arc<Mutex<Vec<Vec<AgentId>>>>) {
        let batches = Arc::new(Mutex::new(Vec::new()));
        (Self { intent, batches: Arc::clone(&batches) }, batches)
    }
}

impl DecisionOracle for RecordingOracle {
    fn name(&self) -> &str {
        "recording"
    }

    fn decide(&mut self, batch: &[AgentSituation], _context: &[String], _now: Millis) -> Vec<Decision> {
        self.batches.lock().unwrap().push(batch.iter().map(|s| s.agent).collect());
        batch
            .iter()
            .map(|s| Decision { agent: s.agent, intent: self.intent, source: DecisionSource::Oracle })
            .collect()
    }
}

/// Transport that never answers inside the oracle's timeout.
struct HangingTransport {
    calls: Arc<AtomicUsize>,
}

impl OracleTransport for HangingTransport {
    fn complete(&self, _request: &str, _timeout: Duration) -> OracleResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(300));
        Ok(r#"{"decisions":[]}"#.to_owned())
    }

    fn probe(&self, _timeout: Duration) -> bool {
        false
    }
}

/// Default config pinned to NORMAL pacing (500 ms, batch 16).
fn config() -> HiveConfig {
    let mut cfg = HiveConfig::default();
    cfg.resources.allow_performance = false;
    cfg
}

type TestBrain = Brain<ScriptedWorld, RecordingSink, DeadLinks>;

fn build(cfg: HiveConfig, world: ScriptedWorld, oracle: impl DecisionOracle) -> (TestBrain, ManualClock, ManualProbe) {
    build_with_links(cfg, world, oracle, DeadLinks::default())
}

fn build_with_links(
    cfg:    HiveConfig,
    world:  ScriptedWorld,
    oracle: impl DecisionOracle,
    links:  DeadLinks,
) -> (TestBrain, ManualClock, ManualProbe) {
    let clock = ManualClock::new();
    let probe = ManualProbe::new(10.0, 10.0);
    let brain = BrainBuilder::new(cfg, world, RecordingSink::default(), links)
        .oracle(oracle)
        .probe(probe.clone())
        .clock(clock.clone())
        .build()
        .unwrap();
    (brain, clock, probe)
}

fn run_until(brain: &mut TestBrain, clock: &ManualClock, until: Millis) -> Vec<TickReport> {
    let mut out = Vec::new();
    while clock.now() < until {
        out.extend(brain.run_ticks(1, &mut NoopObserver).unwrap());
    }
    out
}

fn decision(report: &TickReport, agent: u32) -> (Intent, DecisionSource, AdaptReason) {
    let d = report.decision_for(AgentId(agent)).unwrap();
    (d.intent, d.source, d.reason)
}

// ── Builder / lifecycle ───────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use super::*;

    struct StopAfter {
        stop: StopHandle,
        after: u64,
        seen: Vec<Tick>,
        started: bool,
        stopped_at: Option<Tick>,
        snapshots: usize,
    }

    impl BrainObserver for StopAfter {
        fn on_start(&mut self, _at: Millis) {
            self.started = true;
        }

        fn on_tick_end(&mut self, report: &TickReport) {
            self.seen.push(report.tick);
            if report.tick.0 >= self.after {
                self.stop.stop();
            }
        }

        fn on_snapshot(&mut self, _snapshot: &TelemetrySnapshot) {
            self.snapshots += 1;
        }

        fn on_stop(&mut self, final_tick: Tick) {
            self.stopped_at = Some(final_tick);
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = config();
        cfg.decision.cache_ttl_ms = cfg.decision.min_redecision_ms;
        let result = BrainBuilder::new(cfg, ScriptedWorld::default(), RecordingSink::default(), DeadLinks::default())
            .probe(ManualProbe::new(0.0, 0.0))
            .clock(ManualClock::new())
            .build();
        assert!(matches!(result, Err(BrainError::Config(_))));
    }

    #[test]
    fn idle_ticking_stopped() {
        let (mut brain, _, _) = build(config(), ScriptedWorld::default(), RuleBasedOracle::default());
        assert_eq!(brain.state(), BrainState::Idle);
        brain.start().unwrap();
        assert_eq!(brain.state(), BrainState::Ticking);
        assert!(matches!(brain.start(), Err(BrainError::AlreadyTicking)));
        brain.stop();
        assert_eq!(brain.state(), BrainState::Stopped);
        assert!(matches!(brain.start(), Err(BrainError::Stopped)));
        assert!(matches!(brain.run_ticks(1, &mut NoopObserver), Err(BrainError::Stopped)));
    }

    #[test]
    fn observer_stop_ends_run_after_current_tick() {
        let world = ScriptedWorld::of([calm(0, Role::Farmer)]);
        let (mut brain, clock, _) = build(config(), world, RuleBasedOracle::default());
        let mut obs = StopAfter {
            stop: brain.stop_handle(),
            after: 3,
            seen: Vec::new(),
            started: false,
            stopped_at: None,
            snapshots: 0,
        };
        brain.run(&mut obs).unwrap();
        assert!(obs.started);
        assert_eq!(obs.seen, vec![Tick(0), Tick(1), Tick(2), Tick(3)]);
        assert_eq!(obs.stopped_at, Some(Tick(4)));
        assert_eq!(obs.snapshots, 1);
        assert_eq!(brain.state(), BrainState::Stopped);
        assert_eq!(clock.now(), Millis(1_500), "no sleep after the stop");
        assert!(matches!(brain.run(&mut NoopObserver), Err(BrainError::Stopped)));
    }

    #[test]
    fn stop_from_another_thread() {
        let world = ScriptedWorld::of([calm(0, Role::Miner), calm(1, Role::Guard)]);
        let (mut brain, _, _) = build(config(), world, RuleBasedOracle::default());
        let stop = brain.stop_handle();
        let runner = thread::spawn(move || {
            brain.run(&mut NoopObserver).map(|()| brain.tick())
        });
        thread::sleep(Duration::from_millis(20));
        stop.stop();
        let ticks = runner.join().unwrap().unwrap();
        assert!(ticks.0 > 0);
        assert_eq!(stop.state(), BrainState::Stopped);
    }

    #[test]
    fn ticks_are_paced_by_governor_interval() {
        let world = ScriptedWorld::of([calm(0, Role::Farmer)]);
        let (mut brain, clock, _) = build(config(), world, RuleBasedOracle::default());
        let reports = brain.run_ticks(4, &mut NoopObserver).unwrap();
        let starts: Vec<u64> = reports.iter().map(|r| r.started_at.0).collect();
        assert_eq!(starts, vec![0, 500, 1_000, 1_500]);
        assert_eq!(clock.now(), Millis(2_000));
        assert_eq!(brain.tick(), Tick(4));
    }

    #[test]
    fn snapshots_every_n_ticks() {
        let world = ScriptedWorld::of([calm(0, Role::Farmer)]);
        let (mut brain, _, _) = build(config(), world, RuleBasedOracle::default());
        let mut obs = StopAfter {
            stop: brain.stop_handle(),
            after: u64::MAX,
            seen: Vec::new(),
            started: false,
            stopped_at: None,
            snapshots: 0,
        };
        brain.run_ticks(21, &mut obs).unwrap();
        assert_eq!(obs.snapshots, 3);
        assert_eq!(obs.stopped_at, None);
        assert_eq!(brain.state(), BrainState::Ticking);
    }
}

// ── Decisions ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod decisions {
    use super::*;

    #[test]
    fn starving_agent_eats_whatever_the_mind_says() {
        let hungry = calm(0, Role::Builder).with_needs(Needs::new(95.0, 10.0, 0.0, 10.0));
        let (oracle, batches) = RecordingOracle::new(Intent::Explore);
        let (mut brain, _, _) = build(config(), ScriptedWorld::of([hungry]), oracle);
        let report = &brain.run_ticks(1, &mut NoopObserver).unwrap()[0];
        assert_eq!(decision(report, 0).0, Intent::Eat);
        assert_eq!(decision(report, 0).1, DecisionSource::Mind);
        assert!(batches.lock().unwrap().is_empty(), "urgent needs never wait for the oracle");
    }

    #[test]
    fn starving_agent_eats_whatever_the_oracle_says() {
        let mut cfg = config();
        cfg.decision.urgent_ceiling = 99.0;
        let hungry = calm(0, Role::Builder).with_needs(Needs::new(95.0, 10.0, 0.0, 10.0));
        let (oracle, batches) = RecordingOracle::new(Intent::Explore);
        let (mut brain, _, _) = build(cfg, ScriptedWorld::of([hungry]), oracle);
        let report = &brain.run_ticks(1, &mut NoopObserver).unwrap()[0];
        assert_eq!(batches.lock().unwrap().len(), 1);
        assert_eq!(decision(report, 0), (Intent::Eat, DecisionSource::Oracle, AdaptReason::NeedOverride));
        assert_eq!(brain.sink.applied[0].1, Intent::Eat);
    }

    #[test]
    fn timed_out_oracle_falls_back_for_all_ten_without_retry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let oracle_cfg = OracleConfig { timeout_ms: 20, ..OracleConfig::default() };
        let oracle = ModelOracle::new(HangingTransport { calls: Arc::clone(&calls) }, &oracle_cfg);
        let world = ScriptedWorld::of((0..10).map(|i| calm(i, Role::Miner)));
        let (mut brain, _, _) = build(config(), world, oracle);

        let report = &brain.run_ticks(1, &mut NoopObserver).unwrap()[0];
        assert_eq!(report.deliberated, 10);
        assert_eq!(report.decisions.len(), 10);
        for d in &report.decisions {
            assert_eq!(d.source, DecisionSource::Fallback);
            assert_eq!(d.intent, Intent::Mine);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1, "one batched call, no retry");
        assert_eq!(brain.snapshot().sources.fallback, 10);
    }

    #[test]
    fn held_agents_still_get_emergency_overrides() {
        let world = ScriptedWorld::of([calm(0, Role::Miner)]);
        let (mut brain, _, _) = build(config(), world, RuleBasedOracle::default());
        let first = &brain.run_ticks(1, &mut NoopObserver).unwrap()[0];
        assert_eq!(decision(first, 0), (Intent::Mine, DecisionSource::Rules, AdaptReason::Unchanged));

        brain.world.set_needs(0, Needs::new(95.0, 10.0, 0.0, 10.0));
        let held = &brain.run_ticks(1, &mut NoopObserver).unwrap()[0];
        assert_eq!(held.held, 1);
        assert_eq!(decision(held, 0), (Intent::Eat, DecisionSource::Held, AdaptReason::NeedOverride));
    }

    #[test]
    fn held_agents_without_emergency_apply_nothing() {
        let world = ScriptedWorld::of([calm(0, Role::Miner), calm(1, Role::Farmer)]);
        let (mut brain, _, _) = build(config(), world, RuleBasedOracle::default());
        let reports = brain.run_ticks(2, &mut NoopObserver).unwrap();
        assert_eq!(reports[0].decisions.len(), 2);
        assert_eq!(reports[1].held, 2);
        assert!(reports[1].decisions.is_empty());
        assert_eq!(brain.sink.applied.len(), 2);
    }

    #[test]
    fn repeated_work_is_broken_up() {
        let world = ScriptedWorld::of([calm(0, Role::Miner)]);
        let (mut brain, _, _) = build(config(), world, RuleBasedOracle::default());
        let reports = brain.run_ticks(10, &mut NoopObserver).unwrap();
        let fresh: Vec<_> = reports.iter().filter(|r| !r.decisions.is_empty()).map(|r| decision(r, 0)).collect();
        assert_eq!(fresh.len(), 5);
        assert!(fresh[..4].iter().all(|d| d.0 == Intent::Mine));
        let (intent, _, reason) = fresh[4];
        assert_eq!(reason, AdaptReason::StuckLoop);
        assert_ne!(intent, Intent::Mine);
        assert!(Role::Miner.alternates().contains(&intent));
        assert_eq!(brain.snapshot().agents[0].overrides.stuck, 1);
    }

    #[test]
    fn batch_window_rotates_across_ticks() {
        let mut cfg = config();
        cfg.ticks.normal_batch_size = 2;
        let (oracle, batches) = RecordingOracle::new(Intent::Mine);
        let world = ScriptedWorld::of((0..5).map(|i| calm(i, Role::Miner)));
        let (mut brain, _, _) = build(cfg, world, oracle);

        let reports = brain.run_ticks(5, &mut NoopObserver).unwrap();
        assert_eq!((reports[0].deliberated, reports[0].deferred), (2, 3));
        assert_eq!(decision(&reports[0], 4).1, DecisionSource::Mind);
        assert_eq!(reports[1].held, 5);

        let ids = |raw: &[u32]| raw.iter().map(|&a| AgentId(a)).collect::<Vec<_>>();
        assert_eq!(*batches.lock().unwrap(), vec![ids(&[0, 1]), ids(&[2, 3]), ids(&[0, 4])]);
    }

    #[test]
    fn assigned_task_reaches_the_sink_with_its_target() {
        let world = ScriptedWorld::of([calm(0, Role::Miner)]);
        let (mut brain, _, _) = build(config(), world, RuleBasedOracle::default());
        assert!(!brain.assign_task(AgentId(0), Intent::Build, None), "agent not tracked yet");
        brain.run_ticks(2, &mut NoopObserver).unwrap();

        let target = Location { x: 4, y: 64, z: -2 };
        assert!(brain.assign_task(AgentId(0), Intent::Build, Some(target)));
        let report = &brain.run_ticks(1, &mut NoopObserver).unwrap()[0];
        assert_eq!(decision(report, 0), (Intent::Build, DecisionSource::Mind, AdaptReason::Unchanged));
        let (_, intent, details) = brain.sink.applied.last().copied().unwrap();
        assert_eq!(intent, Intent::Build);
        assert_eq!(details.target, Some(target));

        assert!(brain.complete_task(AgentId(0)));
        brain.run_ticks(2, &mut NoopObserver).unwrap();
        assert_ne!(brain.sink.applied.last().unwrap().1, Intent::Build);
    }

    #[test]
    fn sink_failures_do_not_stop_the_tick() {
        let world = ScriptedWorld::of((0..3).map(|i| calm(i, Role::Farmer)));
        let (mut brain, _, _) = build(config(), world, RuleBasedOracle::default());
        brain.sink.reject.insert(AgentId(0));
        brain.sink.panic_on.insert(AgentId(1));
        let report = &brain.run_ticks(1, &mut NoopObserver).unwrap()[0];
        assert_eq!(report.sink_errors, 2);
        assert_eq!(report.decisions.len(), 3);
        assert_eq!(brain.sink.applied.len(), 1);
        assert_eq!(brain.sink.applied[0].0, AgentId(2));
    }

    #[test]
    fn unobservable_agents_are_skipped() {
        let mut world = ScriptedWorld::of([calm(0, Role::Farmer)]);
        world.ghosts.push(AgentId(9));
        let (mut brain, _, _) = build(config(), world, RuleBasedOracle::default());
        let report = &brain.run_ticks(1, &mut NoopObserver).unwrap()[0];
        assert_eq!((report.live, report.unobserved), (2, 1));
        assert_eq!(report.decisions.len(), 1);
        assert_eq!(brain.tracked_agents(), 1);
    }
}

// ── Knowledge ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod knowledge {
    use super::*;

    #[test]
    fn advice_refreshes_only_when_stale() {
        let world = ScriptedWorld::of([calm(0, Role::Farmer), calm(1, Role::Guard)]);
        let (mut brain, clock, _) = build(config(), world, RuleBasedOracle::default());
        let reports = run_until(&mut brain, &clock, Millis(6_000));
        let refreshed: Vec<u64> = reports.iter().filter(|r| r.advice.is_some()).map(|r| r.started_at.0).collect();
        assert_eq!(refreshed, vec![0, 5_500]);
        assert!(!brain.advice().is_empty());
        assert_eq!(brain.aggregate().map(|a| a.population), Some(2));
    }
}

// ── Governor / watchdog integration ───────────────────────────────────────────

#[cfg(test)]
mod governance {
    use super::*;

    #[test]
    fn sustained_cpu_throttles_and_self_heals() {
        let world = ScriptedWorld::of([calm(0, Role::Farmer)]);
        let (mut brain, clock, probe) = build(config(), world, RuleBasedOracle::default());
        probe.set_cpu_percent(90.0);
        let reports = run_until(&mut brain, &clock, Millis(31_000));

        let checks: Vec<_> = reports.iter().filter_map(|r| r.health.as_ref()).collect();
        let statuses: Vec<_> = checks.iter().map(|c| c.health.status).collect();
        assert_eq!(statuses, vec![
            HealthStatus::Healthy,
            HealthStatus::Critical,
            HealthStatus::Critical,
            HealthStatus::Critical,
        ]);
        assert!(checks[3].actions.contains(&GovernorAction::SelfHeal));

        let health = brain.health();
        assert!(health.is_throttled());
        assert!(health.self_healing);
        assert_eq!(brain.tick_interval(), Duration::from_millis(4_000));
    }

    #[test]
    fn departed_agents_are_dropped_while_healthy() {
        let world = ScriptedWorld::of((0..4).map(|i| calm(i, Role::Farmer)));
        let (mut brain, _, _) = build(config(), world, RuleBasedOracle::default());
        let mut applied = 0;
        for round in 1..=200u32 {
            applied += brain.run_ticks(1, &mut NoopObserver).unwrap()[0].decisions.len();
            brain.world.agents.clear();
            for i in 0..4 {
                let s = calm(round * 4 + i, Role::Farmer);
                brain.world.agents.insert(s.agent, Observation::new(s));
            }
        }
        assert_eq!(brain.tracked_agents(), 4);
        assert_eq!(brain.health().status, HealthStatus::Healthy);

        let snap = brain.snapshot();
        assert_eq!(snap.agents.len(), 4);
        assert_eq!(snap.sources.total(), applied as u64, "departed counts are kept");
    }

    #[test]
    fn memory_warning_reclaims_without_losing_live_agents() {
        let world = ScriptedWorld::of((0..3).map(|i| calm(i, Role::Farmer)));
        let (mut brain, clock, probe) = build(config(), world, RuleBasedOracle::default());
        brain.run_ticks(1, &mut NoopObserver).unwrap();
        assert_eq!(brain.tracked_agents(), 3);

        brain.world.agents.remove(&AgentId(2));
        brain.run_ticks(1, &mut NoopObserver).unwrap();
        assert_eq!(brain.tracked_agents(), 2);

        probe.set_memory_percent(70.0);
        let reports = run_until(&mut brain, &clock, Millis(31_000));
        let reclaim = GovernorAction::ReclaimMemory { aggressive: false };
        assert!(reports.iter().filter_map(|r| r.health.as_ref()).any(|c| c.actions.contains(&reclaim)));
        assert_eq!(brain.tracked_agents(), 2);
        assert_eq!(brain.health().status, HealthStatus::Warning);
    }

    #[test]
    fn unreachable_agent_degrades_after_cap() {
        let links = DeadLinks { down: [AgentId(1)].into_iter().collect(), attempts: 0 };
        let world = ScriptedWorld::of([calm(0, Role::Farmer), calm(1, Role::Trader)]);
        let (mut brain, clock, _) = build_with_links(config(), world, RuleBasedOracle::default(), links);

        run_until(&mut brain, &clock, Millis(25_000));
        assert_eq!(brain.watchdog().connector.attempts, 5);
        let snap = brain.snapshot();
        assert_eq!(snap.degraded_agents(), 1);
        assert!(snap.agents.iter().any(|a| a.agent == AgentId(1) && a.degraded));

        run_until(&mut brain, &clock, Millis(120_000));
        assert_eq!(brain.watchdog().connector.attempts, 5, "no attempts past the cap");

        brain.reset_connection(AgentId(1));
        run_until(&mut brain, &clock, Millis(123_000));
        assert_eq!(brain.watchdog().connector.attempts, 6);
    }
}

// ── Snapshot / helpers ────────────────────────────────────────────────────────

#[cfg(test)]
mod export {
    use super::*;

    #[test]
    fn snapshot_counts_match_applied_decisions() {
        let world = ScriptedWorld::of((0..4).map(|i| calm(i, Role::Explorer)));
        let (mut brain, _, _) = build(config(), world, RuleBasedOracle::default());
        let reports = brain.run_ticks(6, &mut NoopObserver).unwrap();
        let applied: usize = reports.iter().map(|r| r.decisions.len()).sum();

        let snap = brain.snapshot();
        assert_eq!(snap.sources.total(), applied as u64);
        assert_eq!(snap.agents.len(), 4);
        assert_eq!(snap.state, BrainState::Ticking);
        assert_eq!(snap.oracle_name, "rules");

        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"state\":\"TICKING\""));
        assert!(json.contains("\"status\":\"HEALTHY\""));
    }

    #[test]
    fn window_rotation() {
        let agents: Vec<AgentId> = [1, 3, 5, 7, 9].into_iter().map(AgentId).collect();
        assert_eq!(rotate_window(&agents, AgentId(0), 2), (vec![0, 1], AgentId(4)));
        assert_eq!(rotate_window(&agents, AgentId(4), 2), (vec![2, 3], AgentId(8)));
        assert_eq!(rotate_window(&agents, AgentId(8), 2), (vec![0, 4], AgentId(2)));
        assert_eq!(rotate_window(&agents, AgentId(50), 3), (vec![0, 1, 2], AgentId(6)));
        assert_eq!(rotate_window(&agents, AgentId(3), 9), (vec![0, 1, 2, 3, 4], AgentId(3)));
    }
}
