//! Startup configuration.
//!
//! `HiveConfig` is loaded once (usually from a TOML file by the application
//! crate), validated, and handed to the scheduler builder by value.  Every
//! section is `#[serde(default)]`, so a file only needs the keys it changes:
//!
//! ```toml
//! seed = 7
//!
//! [resources]
//! warning_percent  = 60.0
//! critical_percent = 80.0
//!
//! [reconnect]
//! max_attempts = 8
//! ```
//!
//! Durations are stored as integer milliseconds and exposed as
//! [`Duration`] through accessor methods.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{HiveError, HiveResult, Intent};

// ── HiveConfig ────────────────────────────────────────────────────────────────

/// Top-level configuration for one run of the governance loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiveConfig {
    /// Master RNG seed.  The same seed and inputs reproduce the same nudges.
    pub seed: u64,
    pub resources: ResourceConfig,
    pub ticks: TickConfig,
    pub decision: DecisionConfig,
    pub oracle: OracleConfig,
    pub reconnect: ReconnectConfig,
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            resources: ResourceConfig::default(),
            ticks: TickConfig::default(),
            decision: DecisionConfig::default(),
            oracle: OracleConfig::default(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl HiveConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> HiveResult<Self> {
        let config: HiveConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load(path: &Path) -> HiveResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject combinations the loop cannot honor.
    pub fn validate(&self) -> HiveResult<()> {
        self.resources.validate()?;
        self.ticks.validate()?;
        self.decision.validate()?;
        self.oracle.validate()?;
        self.reconnect.validate()?;
        Ok(())
    }
}

fn config_err<T>(msg: impl Into<String>) -> HiveResult<T> {
    Err(HiveError::Config(msg.into()))
}

fn check_percent(name: &str, value: f32) -> HiveResult<()> {
    if !(0.0..=100.0).contains(&value) {
        return config_err(format!("{name} must be within 0..=100, got {value}"));
    }
    Ok(())
}

// ── Resources ─────────────────────────────────────────────────────────────────

/// Telemetry sampling and governor thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Usage at or above this percentage is WARNING (default 65).
    pub warning_percent: f32,
    /// Usage above this percentage is CRITICAL (default 85).
    pub critical_percent: f32,
    /// PERFORMANCE mode is entered only while both metrics are below this
    /// percentage (default 30).
    pub performance_below_percent: f32,
    /// Whether the governor may raise the mode above NORMAL.
    pub allow_performance: bool,
    pub cpu_sample_interval_ms: u64,
    pub memory_sample_interval_ms: u64,
    /// Number of CPU samples averaged into the reported value (default 10).
    pub cpu_window: usize,
    pub health_check_interval_ms: u64,
    /// Consecutive WARNING/CRITICAL checks before self-healing (default 3).
    pub max_unhealthy_checks: u32,
    pub self_heal_cooldown_ms: u64,
    /// Memory budget the process RSS is measured against.  `None` uses total
    /// system memory.
    pub memory_budget_mb: Option<u64>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            warning_percent:           65.0,
            critical_percent:          85.0,
            performance_below_percent: 30.0,
            allow_performance:         true,
            cpu_sample_interval_ms:    10_000,
            memory_sample_interval_ms: 30_000,
            cpu_window:                10,
            health_check_interval_ms:  10_000,
            max_unhealthy_checks:      3,
            self_heal_cooldown_ms:     30_000,
            memory_budget_mb:          None,
        }
    }
}

impl ResourceConfig {
    pub fn cpu_sample_interval(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_interval_ms)
    }

    pub fn memory_sample_interval(&self) -> Duration {
        Duration::from_millis(self.memory_sample_interval_ms)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    pub fn self_heal_cooldown(&self) -> Duration {
        Duration::from_millis(self.self_heal_cooldown_ms)
    }

    fn validate(&self) -> HiveResult<()> {
        check_percent("resources.warning_percent", self.warning_percent)?;
        check_percent("resources.critical_percent", self.critical_percent)?;
        check_percent("resources.performance_below_percent", self.performance_below_percent)?;
        if self.warning_percent >= self.critical_percent {
            return config_err("resources.warning_percent must be below critical_percent");
        }
        if self.performance_below_percent > self.warning_percent {
            return config_err("resources.performance_below_percent must not exceed warning_percent");
        }
        if self.cpu_window == 0 {
            return config_err("resources.cpu_window must be at least 1");
        }
        if self.max_unhealthy_checks == 0 {
            return config_err("resources.max_unhealthy_checks must be at least 1");
        }
        if self.memory_budget_mb == Some(0) {
            return config_err("resources.memory_budget_mb must be positive when set");
        }
        Ok(())
    }
}

// ── Ticks ─────────────────────────────────────────────────────────────────────

/// Tick pacing and batch sizing per operating mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    pub eco_interval_ms: u64,
    pub normal_interval_ms: u64,
    pub performance_interval_ms: u64,
    pub eco_batch_size: usize,
    pub normal_batch_size: usize,
    pub performance_batch_size: usize,
    /// Cached world knowledge older than this is refreshed (default 5 s).
    pub knowledge_refresh_ms: u64,
    /// Fraction of the tick interval after which a slow tick is logged.
    pub budget_warn_ratio: f64,
    /// Connection watchdog runs every N ticks (default 5).
    pub reconcile_every_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            eco_interval_ms:         1_000,
            normal_interval_ms:      500,
            performance_interval_ms: 250,
            eco_batch_size:          8,
            normal_batch_size:       16,
            performance_batch_size:  32,
            knowledge_refresh_ms:    5_000,
            budget_warn_ratio:       0.8,
            reconcile_every_ticks:   5,
        }
    }
}

impl TickConfig {
    pub fn knowledge_refresh(&self) -> Duration {
        Duration::from_millis(self.knowledge_refresh_ms)
    }

    fn validate(&self) -> HiveResult<()> {
        if self.eco_interval_ms == 0 || self.normal_interval_ms == 0 || self.performance_interval_ms == 0 {
            return config_err("ticks intervals must be positive");
        }
        if self.eco_interval_ms < self.normal_interval_ms {
            return config_err("ticks.eco_interval_ms must not be shorter than normal_interval_ms");
        }
        if self.eco_batch_size == 0 || self.normal_batch_size == 0 || self.performance_batch_size == 0 {
            return config_err("ticks batch sizes must be at least 1");
        }
        if !(self.budget_warn_ratio > 0.0 && self.budget_warn_ratio <= 1.0) {
            return config_err("ticks.budget_warn_ratio must be within (0, 1]");
        }
        if self.reconcile_every_ticks == 0 {
            return config_err("ticks.reconcile_every_ticks must be at least 1");
        }
        Ok(())
    }
}

// ── Decision ──────────────────────────────────────────────────────────────────

/// Mind, cache, and adaptation tuning.
///
/// The stuck-loop and emergency thresholds are empirical defaults, kept
/// configurable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// A Mind re-decides at most once per this interval (default 1000 ms).
    pub min_redecision_ms: u64,
    /// Cache entries older than this are treated as absent.  Must be shorter
    /// than `min_redecision_ms`.
    pub cache_ttl_ms: u64,
    pub cache_capacity: usize,
    /// Entries kept in each agent's decision history (at most 20).
    pub history_len: usize,
    pub stuck_window: usize,
    pub stuck_threshold: usize,
    /// Intents an agent may repeat indefinitely without being flagged.
    pub allowed_repeats: Vec<Intent>,
    pub emergency_safety: f32,
    pub emergency_hunger: f32,
    pub emergency_energy: f32,
    /// Need level at which a Mind raises an URGENT thought (default 85).
    pub urgent_ceiling: f32,
    /// Health at or below this is a life threat (default 25).
    pub critical_health: f32,
    /// Lifetime of thoughts derived from state updates.
    pub thought_ttl_ms: u64,
    pub thought_capacity: usize,
    pub memory_capacity: usize,
    pub nudge: NudgeConfig,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            min_redecision_ms: 1_000,
            cache_ttl_ms:      800,
            cache_capacity:    512,
            history_len:       20,
            stuck_window:      5,
            stuck_threshold:   4,
            allowed_repeats:   vec![Intent::Rest, Intent::Eat, Intent::Sleep],
            emergency_safety:  70.0,
            emergency_hunger:  85.0,
            emergency_energy:  90.0,
            urgent_ceiling:    85.0,
            critical_health:   25.0,
            thought_ttl_ms:    5_000,
            thought_capacity:  32,
            memory_capacity:   50,
            nudge:             NudgeConfig::default(),
        }
    }
}

/// Upper bound on `DecisionConfig::history_len`.
pub const MAX_HISTORY_LEN: usize = 20;

impl DecisionConfig {
    pub fn min_redecision(&self) -> Duration {
        Duration::from_millis(self.min_redecision_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn thought_ttl(&self) -> Duration {
        Duration::from_millis(self.thought_ttl_ms)
    }

    fn validate(&self) -> HiveResult<()> {
        if self.cache_ttl_ms >= self.min_redecision_ms {
            return config_err("decision.cache_ttl_ms must be shorter than min_redecision_ms");
        }
        if self.cache_capacity == 0 {
            return config_err("decision.cache_capacity must be at least 1");
        }
        if self.history_len == 0 || self.history_len > MAX_HISTORY_LEN {
            return config_err(format!("decision.history_len must be within 1..={MAX_HISTORY_LEN}"));
        }
        if self.stuck_threshold == 0 || self.stuck_threshold > self.stuck_window {
            return config_err("decision.stuck_threshold must be within 1..=stuck_window");
        }
        if self.stuck_window > self.history_len {
            return config_err("decision.stuck_window must not exceed history_len");
        }
        check_percent("decision.emergency_safety", self.emergency_safety)?;
        check_percent("decision.emergency_hunger", self.emergency_hunger)?;
        check_percent("decision.emergency_energy", self.emergency_energy)?;
        check_percent("decision.urgent_ceiling", self.urgent_ceiling)?;
        check_percent("decision.critical_health", self.critical_health)?;
        if self.thought_capacity == 0 || self.memory_capacity == 0 {
            return config_err("decision thought/memory capacities must be at least 1");
        }
        self.nudge.validate()
    }
}

/// Parameters of the personality nudge table.
///
/// For a trait value `t` and need pressure `p` (both in `[0, 1]`):
///
/// ```text
/// probability = 0                                                  if t < trait_floor or p > pressure_ceiling
///             = max_probability * (t - floor) / (1 - floor) * (1 - p / ceiling)   otherwise
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    pub trait_floor: f64,
    pub pressure_ceiling: f64,
    pub max_probability: f64,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            trait_floor:      0.6,
            pressure_ceiling: 0.5,
            max_probability:  0.3,
        }
    }
}

impl NudgeConfig {
    fn validate(&self) -> HiveResult<()> {
        if !(0.0..1.0).contains(&self.trait_floor) {
            return config_err("decision.nudge.trait_floor must be within [0, 1)");
        }
        if !(self.pressure_ceiling > 0.0 && self.pressure_ceiling <= 1.0) {
            return config_err("decision.nudge.pressure_ceiling must be within (0, 1]");
        }
        if !(0.0..=1.0).contains(&self.max_probability) {
            return config_err("decision.nudge.max_probability must be within [0, 1]");
        }
        Ok(())
    }
}

// ── Oracle ────────────────────────────────────────────────────────────────────

/// Model-backed oracle settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL of the decision service.  `None` runs rule-based only.
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
    /// Cached availability is re-probed no more often than this.
    pub availability_recheck_ms: u64,
    /// Number of latency samples in the rolling average.
    pub latency_window: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint:                None,
            timeout_ms:              5_000,
            availability_recheck_ms: 30_000,
            latency_window:          20,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn availability_recheck(&self) -> Duration {
        Duration::from_millis(self.availability_recheck_ms)
    }

    fn validate(&self) -> HiveResult<()> {
        if self.timeout_ms == 0 {
            return config_err("oracle.timeout_ms must be positive");
        }
        if self.latency_window == 0 {
            return config_err("oracle.latency_window must be at least 1");
        }
        Ok(())
    }
}

// ── Reconnect ─────────────────────────────────────────────────────────────────

/// Connection watchdog backoff policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Failed attempts before an agent is marked permanently degraded.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts:  5,
            base_delay_ms: 1_000,
            multiplier:    2.0,
            max_delay_ms:  60_000,
        }
    }
}

impl ReconnectConfig {
    /// Wait required after `failures` consecutive failed attempts:
    /// `min(base * multiplier^(failures - 1), max)`.  Zero failures → zero.
    pub fn delay_after(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let exp = failures.saturating_sub(1).min(63) as i32;
        let ms = self.base_delay_ms as f64 * self.multiplier.powi(exp);
        let capped = if ms.is_finite() { ms.min(self.max_delay_ms as f64) } else { self.max_delay_ms as f64 };
        Duration::from_millis(capped as u64)
    }

    fn validate(&self) -> HiveResult<()> {
        if self.max_attempts == 0 {
            return config_err("reconnect.max_attempts must be at least 1");
        }
        if !(self.multiplier >= 1.0) {
            return config_err("reconnect.multiplier must be at least 1.0");
        }
        if self.base_delay_ms > self.max_delay_ms {
            return config_err("reconnect.base_delay_ms must not exceed max_delay_ms");
        }
        Ok(())
    }
}
