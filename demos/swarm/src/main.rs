//! swarm: a synthetic colony driven by the hive loop.
//!
//! Residents' needs drift every tick, raids raise the threat level and
//! links drop at random.  Decisions come from the rule-based oracle unless
//! `oracle.endpoint` is set in the TOML config, in which case the model
//! oracle is used with rule-based fallback.
//!
//! ```text
//! cargo run -p swarm -- --agents 48 --ticks 200 --fast --out telemetry/
//! RUST_LOG=hive_sim=debug cargo run -p swarm -- --config hive.toml
//! ```

mod colony;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use memory_stats::memory_stats;

use hive_agent::Location;
use hive_behavior::{AdaptReason, HttpTransport, ModelOracle};
use hive_core::{AgentId, HiveConfig, Intent, ManualClock, Millis, Role, Tick};
use hive_output::{CsvWriter, TelemetryObserver};
use hive_sim::{BrainBuilder, BrainObserver, StopHandle, TelemetrySnapshot, TickReport};

use colony::Colony;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "swarm", about = "Run the hive loop against a synthetic colony")]
struct Args {
    /// Number of residents.
    #[arg(long, default_value_t = 24)]
    agents: u32,

    /// Stop after this many ticks.
    #[arg(long, default_value_t = 120)]
    ticks: u64,

    /// TOML file overriding the default configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for CSV telemetry (created if missing).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Overrides `seed` from the config.
    #[arg(long)]
    seed: Option<u64>,

    /// Run on a virtual clock instead of sleeping between ticks.
    #[arg(long)]
    fast: bool,

    /// Print the final telemetry snapshot as JSON.
    #[arg(long)]
    json: bool,
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Stops the run after `limit` ticks and forwards to the CSV observer.
struct Session {
    stop:       StopHandle,
    limit:      u64,
    output:     Option<TelemetryObserver<CsvWriter>>,
    ticks:      u64,
    applied:    u64,
    overrides:  u64,
    slow_ticks: u64,
    budget:     f64,
    last:       Option<TelemetrySnapshot>,
}

impl BrainObserver for Session {
    fn on_start(&mut self, at: Millis) {
        info!("colony online at {at:?}");
    }

    fn on_tick_end(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.applied += report.decisions.len() as u64;
        self.overrides += report.decisions.iter().filter(|d| d.reason != AdaptReason::Unchanged).count() as u64;
        if report.over_budget(self.budget) {
            self.slow_ticks += 1;
        }
        if let Some(out) = &mut self.output {
            out.on_tick_end(report);
        }
        if self.ticks >= self.limit {
            self.stop.stop();
        }
    }

    fn on_snapshot(&mut self, snapshot: &TelemetrySnapshot) {
        if let Some(out) = &mut self.output {
            out.on_snapshot(snapshot);
        }
        self.last = Some(snapshot.clone());
    }

    fn on_stop(&mut self, final_tick: Tick) {
        if let Some(out) = &mut self.output {
            out.on_stop(final_tick);
        }
    }
}

fn rss_mb() -> f64 {
    memory_stats()
        .map(|s| s.physical_mem as f64 / (1024.0 * 1024.0))
        .unwrap_or(0.0)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => HiveConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => HiveConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let endpoint = config.oracle.endpoint.clone();
    let budget = config.ticks.budget_warn_ratio;

    println!("=== swarm ===");
    println!(
        "Residents: {}  |  Ticks: {}  |  Seed: {}  |  Oracle: {}",
        args.agents,
        args.ticks,
        config.seed,
        endpoint.as_deref().unwrap_or("rules"),
    );
    println!();

    let (colony, orders, links) = Colony::new(args.agents, config.seed);

    let mut builder = BrainBuilder::new(config.clone(), colony, orders, links);
    if let Some(url) = endpoint {
        builder = builder.oracle(ModelOracle::new(HttpTransport::new(url), &config.oracle));
    }
    if args.fast {
        builder = builder.clock(ManualClock::new());
    }
    let mut brain = builder.build()?;

    let output = match &args.out {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Some(TelemetryObserver::new(CsvWriter::new(dir)?))
        }
        None => None,
    };

    let stop = brain.stop_handle();
    let mut session = Session {
        stop:       stop.clone(),
        limit:      args.ticks,
        output,
        ticks:      0,
        applied:    0,
        overrides:  0,
        slow_ticks: 0,
        budget,
        last:       None,
    };

    let t0 = Instant::now();
    while !stop.is_stopped() {
        brain.run_ticks(1, &mut session)?;

        // Operator command once residents are known: the first builder
        // raises a storehouse at the colony centre.
        if brain.tick() == Tick(1) {
            let builder = (0..args.agents)
                .map(AgentId)
                .find(|&a| brain.mind(a).is_some_and(|m| m.role() == Role::Builder));
            if let Some(builder) = builder {
                brain.assign_task(builder, Intent::Build, Some(Location { x: 0, y: 64, z: 0 }));
                info!("{builder} assigned to build the storehouse");
            }
        }
    }
    let elapsed = t0.elapsed();

    if let Some(e) = session.output.as_mut().and_then(TelemetryObserver::take_error) {
        eprintln!("output error: {e}");
    }

    // ── Summary ──────────────────────────────────────────────────────────
    let snapshot = brain.snapshot();
    let [hunger, energy, safety, social] = brain.world.average_needs();

    println!();
    println!("Run complete in {:.3} s ({} ticks)", elapsed.as_secs_f64(), session.ticks);
    println!("  decisions applied   : {}", session.applied);
    println!("  adaptation overrides: {}", session.overrides);
    println!("  ticks over budget   : {}", session.slow_ticks);
    println!("  intents fed back    : {}", brain.world.applied());
    println!("  health              : {} / {} (throttle {})", snapshot.health.status, snapshot.health.mode, snapshot.health.throttle);
    println!("  degraded links      : {}", snapshot.degraded_agents());
    println!("  cache               : {} entries, {} hits, {} misses", snapshot.cache.entries, snapshot.cache.hits, snapshot.cache.misses);
    println!("  oracle              : {} ({} calls, {} fallbacks)", snapshot.oracle_name, snapshot.oracle.calls, snapshot.oracle.fallbacks);
    println!("  avg needs           : hunger {hunger:.1}  energy {energy:.1}  safety {safety:.1}  social {social:.1}");
    println!("  RSS                 : {:.1} MiB", rss_mb());
    println!();

    println!("{:<8} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8}", "Source", "oracle", "rules", "fallback", "cache", "mind", "held", "sum");
    println!("{}", "-".repeat(70));
    let s = snapshot.sources;
    println!(
        "{:<8} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8}",
        "total", s.oracle, s.rules, s.fallback, s.cache, s.mind, s.held, s.total(),
    );

    if !brain.advice().is_empty() {
        println!();
        println!("Colony advice: {}", brain.advice().join(", "));
    }

    if args.json {
        let last = session.last.as_ref().unwrap_or(&snapshot);
        println!("{}", serde_json::to_string_pretty(last)?);
    }

    // Resident 0 is the only one guaranteed to exist in every run.
    if let Some(h) = brain.history(AgentId(0)) {
        println!();
        println!("Resident 0 last intents: {:?}", h.recent(5).collect::<Vec<_>>());
    }

    Ok(())
}
