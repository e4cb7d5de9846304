//! Sources of raw resource readings.

use std::fs;
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;
use memory_stats::memory_stats;

use crate::{GovernorError, GovernorResult};

/// Cumulative CPU time counters (any consistent unit).  Utilisation over an
/// interval is `1 - Δidle / Δtotal`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct CpuCounters {
    pub idle: u64,
    pub total: u64,
}

impl CpuCounters {
    /// Percent busy between `earlier` and `self`; `None` if no time passed.
    pub fn busy_percent_since(&self, earlier: &CpuCounters) -> Option<f64> {
        let total = self.total.checked_sub(earlier.total)?;
        let idle = self.idle.checked_sub(earlier.idle)?;
        if total == 0 {
            return None;
        }
        let busy = total.saturating_sub(idle) as f64 / total as f64;
        Some((busy * 100.0).clamp(0.0, 100.0))
    }
}

/// Reads OS-level counters.  `None` means "no reading this time"; the
/// telemetry keeps its previous value.
pub trait ResourceProbe: Send + 'static {
    fn cpu_counters(&mut self) -> Option<CpuCounters>;

    /// Process memory as a percentage of the budget (or of physical memory).
    fn memory_percent(&mut self) -> Option<f64>;
}

// ── ProcProbe ─────────────────────────────────────────────────────────────────

const PROC_STAT: &str = "/proc/stat";
const PROC_MEMINFO: &str = "/proc/meminfo";

/// Linux probe: `/proc/stat` for CPU, process RSS over `MemTotal` (or an
/// explicit budget) for memory.
#[derive(Debug, Default)]
pub struct ProcProbe {
    budget_bytes: Option<u64>,
}

impl ProcProbe {
    pub fn new(memory_budget_mb: Option<u64>) -> Self {
        Self { budget_bytes: memory_budget_mb.map(|mb| mb * 1024 * 1024) }
    }

    fn read_cpu() -> GovernorResult<CpuCounters> {
        let text = fs::read_to_string(PROC_STAT).map_err(|source| GovernorError::Io { path: PROC_STAT, source })?;
        parse_proc_stat(&text)
    }

    fn memory_total_bytes(&self) -> GovernorResult<u64> {
        if let Some(b) = self.budget_bytes {
            return Ok(b);
        }
        let text = fs::read_to_string(PROC_MEMINFO).map_err(|source| GovernorError::Io { path: PROC_MEMINFO, source })?;
        parse_mem_total(&text)
    }

    fn read_memory(&self) -> GovernorResult<f64> {
        let rss = memory_stats().ok_or(GovernorError::MemoryStatsUnavailable)?.physical_mem as f64;
        let total = self.memory_total_bytes()? as f64;
        if total <= 0.0 {
            return Err(GovernorError::Parse { path: PROC_MEMINFO, detail: "zero memory total".into() });
        }
        Ok((rss / total * 100.0).clamp(0.0, 100.0))
    }
}

impl ResourceProbe for ProcProbe {
    fn cpu_counters(&mut self) -> Option<CpuCounters> {
        Self::read_cpu().map_err(|e| debug!("cpu probe: {e}")).ok()
    }

    fn memory_percent(&mut self) -> Option<f64> {
        self.read_memory().map_err(|e| debug!("memory probe: {e}")).ok()
    }
}

/// Aggregate `cpu` line: `cpu user nice system idle iowait irq softirq steal ...`.
/// Idle time is `idle + iowait`.
pub fn parse_proc_stat(text: &str) -> GovernorResult<CpuCounters> {
    let bad = |detail: &str| GovernorError::Parse { path: PROC_STAT, detail: detail.to_owned() };
    let line = text
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| bad("no aggregate cpu line"))?;
    let fields = line
        .split_whitespace()
        .skip(1)
        .map(str::parse::<u64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| bad(&e.to_string()))?;
    if fields.len() < 4 {
        return Err(bad("fewer than four cpu fields"));
    }
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    // guest/guest_nice (fields 8, 9) are already counted in user/nice.
    let total = fields.iter().take(8).sum();
    Ok(CpuCounters { idle, total })
}

/// `MemTotal:  16318412 kB` → bytes.
pub fn parse_mem_total(text: &str) -> GovernorResult<u64> {
    let bad = |detail: &str| GovernorError::Parse { path: PROC_MEMINFO, detail: detail.to_owned() };
    let line = text
        .lines()
        .find(|l| l.starts_with("MemTotal:"))
        .ok_or_else(|| bad("no MemTotal line"))?;
    let kb: u64 = line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| bad("MemTotal has no value"))?
        .parse()
        .map_err(|e: std::num::ParseIntError| bad(&e.to_string()))?;
    Ok(kb * 1024)
}

// ── ManualProbe ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ManualState {
    cpu_percent: Option<f64>,
    memory_percent: Option<f64>,
    counters: CpuCounters,
}

/// Scripted probe for tests and demos.  Clones share state, so a test can
/// keep a handle after moving the probe into a scheduler.
///
/// Each [`cpu_counters`](ResourceProbe::cpu_counters) call advances the
/// synthetic counters by 1000 units at the configured utilisation.
#[derive(Clone, Debug, Default)]
pub struct ManualProbe {
    state: Arc<Mutex<ManualState>>,
}

impl ManualProbe {
    pub fn new(cpu_percent: f64, memory_percent: f64) -> Self {
        let probe = Self::default();
        probe.set_cpu_percent(cpu_percent);
        probe.set_memory_percent(memory_percent);
        probe
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ManualState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn set_cpu_percent(&self, percent: f64) {
        self.with_state(|s| s.cpu_percent = Some(percent.clamp(0.0, 100.0)));
    }

    pub fn set_memory_percent(&self, percent: f64) {
        self.with_state(|s| s.memory_percent = Some(percent.clamp(0.0, 100.0)));
    }

    /// Subsequent reads return `None` until set again.
    pub fn go_dark(&self) {
        self.with_state(|s| {
            s.cpu_percent = None;
            s.memory_percent = None;
        });
    }
}

impl ResourceProbe for ManualProbe {
    fn cpu_counters(&mut self) -> Option<CpuCounters> {
        self.with_state(|s| {
            let busy = s.cpu_percent?;
            s.counters.total += 1_000;
            s.counters.idle += ((100.0 - busy) * 10.0).round() as u64;
            Some(s.counters)
        })
    }

    fn memory_percent(&mut self) -> Option<f64> {
        self.with_state(|s| s.memory_percent)
    }
}
