//! Fluent builder for constructing a [`Brain`].

use std::collections::BTreeMap;
use std::sync::Arc;

use hive_agent::MindTuning;
use hive_behavior::{Adapter, DecisionOracle, OracleClient, RuleBasedOracle};
use hive_core::{AgentId, Clock, HiveConfig, SystemClock, Tick};
use hive_governor::{Governor, ProcProbe, ResourceProbe, Telemetry};
use hive_link::{Connector, Watchdog};

use crate::brain::SlotContext;
use crate::{ActionSink, Brain, BrainResult, SourceCounts, StopHandle, WorldView};

/// Fluent builder for [`Brain<W, K, C>`].
///
/// # Required inputs
///
/// - [`HiveConfig`]: validated in [`build`][Self::build]
/// - `W: WorldView`: where situations come from
/// - `K: ActionSink`: where final intents go
/// - `C: Connector`: agent link status and reconnects (use
///   [`hive_link::AlwaysConnected`] when agents have no external channel)
///
/// # Optional inputs (have defaults)
///
/// | Method                 | Default                                   |
/// |------------------------|-------------------------------------------|
/// | `.oracle(o)`           | [`RuleBasedOracle`]                       |
/// | `.probe(p)`            | [`ProcProbe`] with `resources.memory_budget_mb` |
/// | `.clock(c)`            | [`SystemClock`]                           |
/// | `.snapshot_every(n)`   | `10` ticks (`0` disables snapshots)       |
///
/// # Example
///
/// ```rust,ignore
/// let mut brain = BrainBuilder::new(config, world, sink, AlwaysConnected)
///     .oracle(ModelOracle::new(HttpTransport::new(&config.oracle.endpoint), &config.oracle))
///     .build()?;
/// brain.run(&mut NoopObserver)?;
/// ```
pub struct BrainBuilder<W: WorldView, K: ActionSink, C: Connector> {
    config:         HiveConfig,
    world:          W,
    sink:           K,
    connector:      C,
    oracle:         Option<Box<dyn DecisionOracle>>,
    probe:          Option<Box<dyn ResourceProbe>>,
    clock:          Option<Arc<dyn Clock>>,
    snapshot_every: u64,
}

impl<W: WorldView, K: ActionSink, C: Connector> BrainBuilder<W, K, C> {
    /// Create a builder with all required inputs.
    pub fn new(config: HiveConfig, world: W, sink: K, connector: C) -> Self {
        Self {
            config,
            world,
            sink,
            connector,
            oracle:         None,
            probe:          None,
            clock:          None,
            snapshot_every: 10,
        }
    }

    pub fn oracle(mut self, oracle: impl DecisionOracle) -> Self {
        self.oracle = Some(Box::new(oracle));
        self
    }

    pub fn probe(mut self, probe: impl ResourceProbe) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    /// Inject a clock.  Tests pass a [`hive_core::ManualClock`] clone and
    /// keep another handle to read virtual time.
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn snapshot_every(mut self, ticks: u64) -> Self {
        self.snapshot_every = ticks;
        self
    }

    /// Validate the configuration and wire every component.
    pub fn build(self) -> BrainResult<Brain<W, K, C>> {
        self.config.validate()?;
        let cfg = self.config;

        let oracle = self.oracle.unwrap_or_else(|| Box::new(RuleBasedOracle::default()));
        let probe = self
            .probe
            .unwrap_or_else(|| Box::new(ProcProbe::new(cfg.resources.memory_budget_mb)));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));

        Ok(Brain {
            world:          self.world,
            sink:           self.sink,
            client:         OracleClient::new(oracle, &cfg.decision),
            adapter:        Adapter::new(cfg.decision.clone()),
            governor:       Governor::new(cfg.resources.clone(), cfg.ticks.clone()),
            telemetry:      Telemetry::boxed(probe, &cfg.resources),
            watchdog:       Watchdog::new(self.connector, cfg.reconnect.clone()),
            slots:          BTreeMap::new(),
            slot_ctx:       SlotContext {
                tuning:      MindTuning::from(&cfg.decision),
                history_len: cfg.decision.history_len,
                seed:        cfg.seed,
            },
            control:        StopHandle::new(),
            tick:           Tick(0),
            knowledge:      None,
            batch_cursor:   AgentId(0),
            snapshot_every: self.snapshot_every,
            live:           Vec::new(),
            retired:        SourceCounts::default(),
            clock,
            cfg,
        })
    }
}
