//! The `Brain` struct and its tick loop.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use hive_agent::{AgentSituation, DecisionHistory, Location, Mind, MindTuning, Personality, Verdict};
use hive_behavior::{
    AdaptReason, Adapter, AggregateContext, Decision, DecisionSource, OracleClient,
};
use hive_core::{AgentId, AgentRng, Clock, HiveConfig, Intent, Millis, Tick};
use hive_governor::{Governor, GovernorAction, OperatingMode, ResourceHealth, Telemetry};
use hive_link::{Connector, Watchdog};

use crate::{
    ActionSink, AgentCounters, AppliedDecision, BrainError, BrainObserver, BrainResult, BrainState,
    DecisionDetails, Observation, OverrideCounts, SourceCounts, StopHandle, TelemetrySnapshot,
    TickReport, WorldView,
};

#[cfg(feature = "fx-hash")]
type DecisionMap = rustc_hash::FxHashMap<AgentId, Decision>;
#[cfg(not(feature = "fx-hash"))]
type DecisionMap = std::collections::HashMap<AgentId, Decision>;

/// Longest single sleep between ticks; bounds how late a stop is noticed.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

// ── Per-agent state ───────────────────────────────────────────────────────────

/// Everything the scheduler keeps about one agent between ticks.
pub(crate) struct AgentSlot {
    pub(crate) mind: Mind,
    pub(crate) history: DecisionHistory,
    pub(crate) rng: AgentRng,
    pub(crate) sources: SourceCounts,
    pub(crate) overrides: OverrideCounts,
}

impl AgentSlot {
    fn new(agent: AgentId, situation: &AgentSituation, personality: Personality, ctx: &SlotContext) -> Self {
        Self {
            mind:      Mind::new(agent, situation.role, personality, ctx.tuning.clone()),
            history:   DecisionHistory::new(ctx.history_len),
            rng:       AgentRng::new(ctx.seed, agent),
            sources:   SourceCounts::default(),
            overrides: OverrideCounts::default(),
        }
    }
}

/// What a new slot is built from.
pub(crate) struct SlotContext {
    pub(crate) tuning: MindTuning,
    pub(crate) history_len: usize,
    pub(crate) seed: u64,
}

/// One agent's slot and observation for the duration of a tick.
struct Working {
    agent: AgentId,
    slot: AgentSlot,
    obs: Observation,
}

impl Working {
    fn think(&mut self, now: Millis) -> Verdict {
        self.slot.mind.observe(self.obs.situation.clone(), self.obs.perception.clone(), now);
        self.slot.mind.think(now)
    }
}

/// Colony-wide knowledge, rebuilt when stale.
pub(crate) struct Knowledge {
    pub(crate) aggregate: AggregateContext,
    pub(crate) advice: Vec<String>,
    pub(crate) refreshed_at: Millis,
}

/// A final intent and where it came from.
#[derive(Copy, Clone)]
struct Outcome {
    intent: Intent,
    source: DecisionSource,
    reason: AdaptReason,
}

// ── Brain ─────────────────────────────────────────────────────────────────────

/// The tick scheduler ("central brain").
///
/// `Brain<W, K, C>` owns every stateful component of the loop and drives one
/// tick at a time:
///
/// 1. **Refresh**: pull the world's committed state, list live agents,
///    observe each one.  Colony knowledge and oracle advice are rebuilt when
///    older than `ticks.knowledge_refresh_ms`.
/// 2. **Think** (optionally parallel with the `parallel` feature): feed each
///    agent's Mind and ask for a verdict.
/// 3. **Dispatch**: fresh, non-urgent verdicts inside the rotating batch
///    window go to the oracle client as one time-bounded call.  Urgent
///    verdicts and those outside the window keep the Mind's own intent.
/// 4. **Adapt and apply** (sequential, ascending `AgentId`): run every fresh
///    proposal through the adaptation layer, record history, commit to the
///    Mind, hand the intent to the action sink.  Agents inside their
///    re-decision interval are only checked for emergency overrides.
/// 5. **Govern**: poll telemetry, run the governor when due and carry out
///    its actions; reconcile connections every `ticks.reconcile_every_ticks`.
///
/// Ticks are paced by the governor's current interval.  A tick over budget
/// is logged, never cut short.
///
/// Create via [`BrainBuilder`][crate::BrainBuilder].
pub struct Brain<W: WorldView, K: ActionSink, C: Connector> {
    /// Read side of the game adapter.
    pub world: W,

    /// Write side of the game adapter.
    pub sink: K,

    pub(crate) cfg: HiveConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) client: OracleClient,
    pub(crate) adapter: Adapter,
    pub(crate) governor: Governor,
    pub(crate) telemetry: Telemetry,
    pub(crate) watchdog: Watchdog<C>,
    pub(crate) slots: BTreeMap<AgentId, AgentSlot>,
    pub(crate) slot_ctx: SlotContext,
    pub(crate) control: StopHandle,
    pub(crate) tick: Tick,
    pub(crate) knowledge: Option<Knowledge>,
    /// First agent considered for the next over-full batch window.
    pub(crate) batch_cursor: AgentId,
    pub(crate) snapshot_every: u64,
    /// Live agents as of the last tick, ascending.
    pub(crate) live: Vec<AgentId>,
    /// Source counts of agents that have left the world.
    pub(crate) retired: SourceCounts,
}

impl<W: WorldView, K: ActionSink, C: Connector> Brain<W, K, C> {
    // ── Lifecycle ─────────────────────────────────────────────────────────

    pub fn stop_handle(&self) -> StopHandle {
        self.control.clone()
    }

    pub fn state(&self) -> BrainState {
        self.control.state()
    }

    /// `IDLE → TICKING`.
    pub fn start(&mut self) -> BrainResult<()> {
        self.control.begin().map_err(|found| match found {
            BrainState::Stopped => BrainError::Stopped,
            _                   => BrainError::AlreadyTicking,
        })
    }

    /// `→ STOPPED`.  No tick begins afterwards.
    pub fn stop(&self) {
        self.control.stop();
    }

    /// Start and tick until stopped, pacing ticks by the governor's interval.
    pub fn run<O: BrainObserver>(&mut self, observer: &mut O) -> BrainResult<()> {
        self.start()?;
        observer.on_start(self.clock.now());
        while !self.control.is_stopped() {
            let report = self.step(observer);
            self.pace(report.started_at);
        }
        observer.on_stop(self.tick);
        Ok(())
    }

    /// Run at most `n` ticks (starting the scheduler if it is idle), pacing
    /// between them exactly like [`run`][Self::run].  Leaves the scheduler
    /// TICKING unless a stop was requested.
    pub fn run_ticks<O: BrainObserver>(&mut self, n: u64, observer: &mut O) -> BrainResult<Vec<TickReport>> {
        match self.state() {
            BrainState::Stopped => return Err(BrainError::Stopped),
            BrainState::Idle => {
                self.start()?;
                observer.on_start(self.clock.now());
            }
            BrainState::Ticking => {}
        }
        let mut reports = Vec::new();
        for _ in 0..n {
            if self.control.is_stopped() {
                break;
            }
            let report = self.step(observer);
            self.pace(report.started_at);
            reports.push(report);
        }
        if self.control.is_stopped() {
            observer.on_stop(self.tick);
        }
        Ok(reports)
    }

    // ── Read-only views ───────────────────────────────────────────────────

    /// Ticks completed.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn config(&self) -> &HiveConfig {
        &self.cfg
    }

    pub fn health(&self) -> ResourceHealth {
        self.governor.health()
    }

    pub fn mode(&self) -> OperatingMode {
        self.governor.mode()
    }

    pub fn tick_interval(&self) -> Duration {
        self.governor.tick_interval()
    }

    pub fn mind(&self, agent: AgentId) -> Option<&Mind> {
        self.slots.get(&agent).map(|s| &s.mind)
    }

    pub fn history(&self, agent: AgentId) -> Option<&DecisionHistory> {
        self.slots.get(&agent).map(|s| &s.history)
    }

    pub fn tracked_agents(&self) -> usize {
        self.slots.len()
    }

    /// Latest colony advice, if knowledge has been built.
    pub fn advice(&self) -> &[String] {
        self.knowledge.as_ref().map_or(&[], |k| k.advice.as_slice())
    }

    pub fn aggregate(&self) -> Option<&AggregateContext> {
        self.knowledge.as_ref().map(|k| &k.aggregate)
    }

    pub fn watchdog(&self) -> &Watchdog<C> {
        &self.watchdog
    }

    pub fn oracle_client(&self) -> &OracleClient {
        &self.client
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let mut sources = self.retired;
        let agents = self
            .slots
            .iter()
            .map(|(&agent, slot)| {
                sources.merge(&slot.sources);
                AgentCounters {
                    agent,
                    sources:   slot.sources,
                    overrides: slot.overrides,
                    degraded:  self.watchdog.is_degraded(agent),
                }
            })
            .collect();
        TelemetrySnapshot {
            tick:          self.tick,
            taken_at:      self.clock.now(),
            state:         self.state(),
            health:        self.governor.health(),
            oracle_name:   self.client.oracle_name().to_owned(),
            oracle:        self.client.oracle_stats(),
            oracle_panics: self.client.panics(),
            cache:         self.client.cache_stats(),
            sources,
            agents,
        }
    }

    // ── External commands ─────────────────────────────────────────────────

    /// Give an agent a task; its Mind keeps a HIGH thought for it until
    /// [`complete_task`][Self::complete_task].  `false` if the agent is not
    /// tracked yet.
    pub fn assign_task(&mut self, agent: AgentId, intent: Intent, target: Option<Location>) -> bool {
        let now = self.clock.now();
        match self.slots.get_mut(&agent) {
            Some(slot) => {
                slot.mind.assign_task(intent, target, now);
                true
            }
            None => false,
        }
    }

    pub fn complete_task(&mut self, agent: AgentId) -> bool {
        match self.slots.get_mut(&agent) {
            Some(slot) => {
                slot.mind.complete_task();
                true
            }
            None => false,
        }
    }

    /// Manual reset of a degraded agent's connection state.
    pub fn reset_connection(&mut self, agent: AgentId) {
        self.watchdog.reset(agent);
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    fn step<O: BrainObserver>(&mut self, observer: &mut O) -> TickReport {
        let tick = self.tick;
        observer.on_tick_start(tick);
        let report = self.process_tick(tick);
        observer.on_tick_end(&report);
        if self.snapshot_every > 0 && tick.0.is_multiple_of(self.snapshot_every) {
            observer.on_snapshot(&self.snapshot());
        }
        self.tick = tick.next();
        report
    }

    /// Sleep until `started + interval`, in slices, returning early on stop.
    fn pace(&self, started: Millis) {
        let deadline = started + self.governor.tick_interval();
        loop {
            if self.control.is_stopped() {
                return;
            }
            let now = self.clock.now();
            if now >= deadline {
                return;
            }
            self.clock.sleep(deadline.since(now).min(SLEEP_SLICE));
        }
    }

    fn process_tick(&mut self, tick: Tick) -> TickReport {
        let started = self.clock.now();
        let mut report = TickReport { tick, started_at: started, ..TickReport::default() };

        // ── Phase 1: refresh and observe ──────────────────────────────────
        self.world.refresh(started);
        let mut live = self.world.live_agents();
        live.sort_unstable();
        live.dedup();
        report.live = live.len();
        self.retire_departed(&live);

        let mut work = Vec::with_capacity(live.len());
        for &agent in &live {
            match self.world.observe(agent) {
                Some(obs) if obs.situation.agent == agent => {
                    let slot = self.take_slot(agent, &obs.situation);
                    work.push(Working { agent, slot, obs });
                }
                Some(obs) => {
                    warn!("world answered {} when asked for {agent}; skipped this tick", obs.situation.agent);
                    report.unobserved += 1;
                }
                None => report.unobserved += 1,
            }
        }
        self.live = live;

        if self.knowledge_is_stale(started) {
            report.advice = Some(self.refresh_knowledge(&work, started));
        }

        // ── Phase 2: think ────────────────────────────────────────────────
        let verdicts = think_all(&mut work, started);

        // ── Phase 3: dispatch ─────────────────────────────────────────────
        let mut candidates = Vec::new();
        for (i, v) in verdicts.iter().enumerate() {
            if !v.fresh {
                report.held += 1;
            } else if v.needs_deliberation() {
                candidates.push(i);
            }
        }
        let candidate_ids: Vec<AgentId> = candidates.iter().map(|&i| work[i].agent).collect();
        let size = self.governor.batch_size();
        let (window, next_cursor) = rotate_window(&candidate_ids, self.batch_cursor, size);
        self.batch_cursor = next_cursor;
        let batch: Vec<usize> = window.iter().map(|&k| candidates[k]).collect();
        report.deliberated = batch.len();
        report.deferred = candidates.len() - batch.len();

        let decided = self.dispatch(&work, &batch, started);

        // ── Phase 4: adapt and apply ──────────────────────────────────────
        for (w, verdict) in work.iter_mut().zip(&verdicts) {
            let outcome = if verdict.fresh {
                let (proposed, source) = match decided.get(&w.agent) {
                    Some(d) => (d.intent, d.source),
                    None    => (verdict.intent, DecisionSource::Mind),
                };
                let personality = *w.slot.mind.personality();
                let adaptation = self.adapter.adapt(
                    &w.obs.situation,
                    &personality,
                    proposed,
                    &w.slot.history,
                    &mut w.slot.rng,
                );
                Outcome { intent: adaptation.intent, source, reason: adaptation.reason }
            } else {
                match self.adapter.emergency_override(&w.obs.situation) {
                    Some(intent) if intent != verdict.intent => {
                        Outcome { intent, source: DecisionSource::Held, reason: AdaptReason::NeedOverride }
                    }
                    _ => continue,
                }
            };
            self.apply(tick, w, outcome, started, &mut report);
        }

        for w in work {
            self.slots.insert(w.agent, w.slot);
        }

        // ── Phase 5: govern ───────────────────────────────────────────────
        let now = self.clock.now();
        self.telemetry.poll(now);
        if self.governor.is_due(now) {
            let gov = self.governor.evaluate(self.telemetry.reading(), now);
            self.execute(&gov.actions, now);
            report.health = Some(gov);
        }
        if tick.0.is_multiple_of(self.cfg.ticks.reconcile_every_ticks) {
            report.reconcile = Some(self.watchdog.reconcile(&self.live, now));
        }

        report.elapsed = self.clock.now().since(started);
        report.interval = self.governor.tick_interval();
        if report.over_budget(self.cfg.ticks.budget_warn_ratio) {
            warn!(
                "{tick} took {:?}, over {:.0}% of its {:?} budget ({} agents)",
                report.elapsed,
                self.cfg.ticks.budget_warn_ratio * 100.0,
                report.interval,
                report.live,
            );
        }
        report
    }

    /// Remove an agent's slot for the duration of the tick, creating it on
    /// first sight.  A role change starts a fresh Mind but keeps history.
    fn take_slot(&mut self, agent: AgentId, situation: &AgentSituation) -> AgentSlot {
        match self.slots.remove(&agent) {
            Some(mut slot) => {
                if slot.mind.role() != situation.role {
                    info!("{agent} reassigned {} -> {}", slot.mind.role(), situation.role);
                    let personality = *slot.mind.personality();
                    slot.mind = Mind::new(agent, situation.role, personality, self.slot_ctx.tuning.clone());
                }
                slot
            }
            None => {
                debug!("tracking new agent {agent} ({})", situation.role);
                AgentSlot::new(agent, situation, self.world.personality(agent), &self.slot_ctx)
            }
        }
    }

    fn knowledge_is_stale(&self, now: Millis) -> bool {
        match &self.knowledge {
            Some(k) => now.since(k.refreshed_at) > self.cfg.ticks.knowledge_refresh(),
            None    => true,
        }
    }

    fn refresh_knowledge(&mut self, work: &[Working], now: Millis) -> Vec<String> {
        let aggregate = AggregateContext::from_situations(work.iter().map(|w| &w.obs.situation), now);
        let advice = self.client.advise(&aggregate);
        if !self.client.is_available(now) {
            debug!("oracle '{}' unavailable; batches decided by rules", self.client.oracle_name());
        }
        debug!("knowledge refreshed: {} agents, advice {:?}", aggregate.population, advice);
        self.knowledge = Some(Knowledge { aggregate, advice: advice.clone(), refreshed_at: now });
        advice
    }

    /// One time-bounded oracle call for the whole batch.
    fn dispatch(&mut self, work: &[Working], batch: &[usize], now: Millis) -> DecisionMap {
        if batch.is_empty() {
            return DecisionMap::default();
        }
        let situations: Vec<AgentSituation> = batch.iter().map(|&i| work[i].obs.situation.clone()).collect();
        let context: Vec<String> = self.advice().to_vec();
        self.client
            .decide(&situations, &context, now)
            .into_iter()
            .map(|d| (d.agent, d))
            .collect()
    }

    fn apply(&mut self, tick: Tick, w: &mut Working, outcome: Outcome, now: Millis, report: &mut TickReport) {
        let Outcome { intent, source, reason } = outcome;
        let agent = w.agent;
        w.slot.history.record(intent);
        w.slot.sources.record(source);
        w.slot.overrides.record(reason);
        w.slot.mind.commit(intent, now);
        report.sources.record(source);

        let target = match w.slot.mind.current_task() {
            Some((task, target)) if task == intent => target,
            _ => None,
        };
        let details = DecisionDetails { tick, source, reason, target };
        let sink = &mut self.sink;
        let result = panic::catch_unwind(AssertUnwindSafe(|| sink.apply_decision(agent, intent, &details)))
            .unwrap_or_else(|_| Err(BrainError::Sink { agent, reason: "action sink panicked".into() }));
        if let Err(err) = result {
            warn!("{agent}: {intent} not applied: {err}");
            report.sink_errors += 1;
        }
        report.decisions.push(AppliedDecision { agent, intent, source, reason });
    }

    // ── Governor actions ──────────────────────────────────────────────────

    fn execute(&mut self, actions: &[GovernorAction], now: Millis) {
        for &action in actions {
            match action {
                GovernorAction::ReclaimMemory { aggressive } => self.reclaim(now, aggressive),
                GovernorAction::EvictDecisionCache => {
                    let evicted = self.client.evict_cache();
                    debug!("evicted {evicted} decision cache entries");
                }
                GovernorAction::EngageThrottle(throttle) => {
                    info!("throttle {throttle} engaged; tick interval now {:?}", self.governor.tick_interval());
                }
                GovernorAction::SelfHeal => {
                    self.knowledge = None;
                    self.telemetry.reset_window();
                }
                GovernorAction::Recovered => {
                    info!("resources recovered; mode {}", self.governor.mode());
                }
            }
        }
    }

    /// Drop the state of agents no longer live, keeping only their counts.
    fn retire_departed(&mut self, live: &[AgentId]) {
        let retired = &mut self.retired;
        let before = self.slots.len();
        self.slots.retain(|agent, slot| {
            let keep = live.binary_search(agent).is_ok();
            if !keep {
                retired.merge(&slot.sources);
            }
            keep
        });
        let dropped = before - self.slots.len();
        if dropped > 0 {
            debug!("{dropped} departed agents retired");
        }
    }

    /// Rust has no collector to nudge: release what the loop itself holds.
    fn reclaim(&mut self, now: Millis, aggressive: bool) {
        let purged = self.client.purge_cache(now);
        for slot in self.slots.values_mut() {
            slot.mind.compact(now, aggressive);
        }
        self.live.shrink_to_fit();
        if aggressive {
            self.knowledge = None;
        }
        info!(
            "memory reclaimed{}: {purged} cache entries, {} minds compacted",
            if aggressive { " (aggressive)" } else { "" },
            self.slots.len(),
        );
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Feed every Mind its observation and collect verdicts in input order.
///
/// With the `parallel` Cargo feature this runs on Rayon's thread pool; each
/// agent touches only its own slot.
fn think_all(work: &mut [Working], now: Millis) -> Vec<Verdict> {
    #[cfg(not(feature = "parallel"))]
    {
        work.iter_mut().map(|w| w.think(now)).collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        work.par_iter_mut().map(|w| w.think(now)).collect()
    }
}

/// Pick at most `size` of `agents` (ascending) starting at the first agent
/// `>= cursor`, wrapping around.  Returns positions into `agents` in
/// ascending order plus the cursor for the next call.
///
/// When everything fits, all positions are returned and the cursor is kept.
pub(crate) fn rotate_window(agents: &[AgentId], cursor: AgentId, size: usize) -> (Vec<usize>, AgentId) {
    if agents.len() <= size {
        return ((0..agents.len()).collect(), cursor);
    }
    if size == 0 {
        return (Vec::new(), cursor);
    }
    let start = agents.iter().position(|&a| a >= cursor).unwrap_or(0);
    let mut picked: Vec<usize> = (0..size).map(|k| (start + k) % agents.len()).collect();
    let last = agents[picked[size - 1]];
    picked.sort_unstable();
    (picked, AgentId(last.0.wrapping_add(1)))
}
