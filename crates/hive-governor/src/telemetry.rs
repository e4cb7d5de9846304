//! Resource telemetry: periodic sampling and CPU smoothing.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

use hive_core::{Millis, ResourceConfig};

use crate::{CpuCounters, ResourceProbe};

/// Smoothed view handed to the governor.
#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize)]
pub struct TelemetryReading {
    /// Mean of the CPU sample window.
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub cpu_samples: usize,
    pub sampled_at: Millis,
}

/// Samples CPU and memory on their own intervals; a pure producer.
///
/// CPU utilisation needs two counter reads, so the first CPU poll only
/// records a baseline.
pub struct Telemetry {
    probe: Box<dyn ResourceProbe>,
    cpu_interval: Duration,
    memory_interval: Duration,
    next_cpu: Millis,
    next_memory: Millis,
    baseline: Option<CpuCounters>,
    window: VecDeque<f64>,
    window_len: usize,
    memory_percent: f64,
    sampled_at: Millis,
}

impl Telemetry {
    pub fn new(probe: impl ResourceProbe, cfg: &ResourceConfig) -> Self {
        Self::boxed(Box::new(probe), cfg)
    }

    pub fn boxed(probe: Box<dyn ResourceProbe>, cfg: &ResourceConfig) -> Self {
        let window_len = cfg.cpu_window.max(1);
        Self {
            probe,
            cpu_interval: cfg.cpu_sample_interval(),
            memory_interval: cfg.memory_sample_interval(),
            next_cpu: Millis(0),
            next_memory: Millis(0),
            baseline: None,
            window: VecDeque::with_capacity(window_len),
            window_len,
            memory_percent: 0.0,
            sampled_at: Millis(0),
        }
    }

    /// Take whichever samples are due.  Returns `true` if anything was read.
    pub fn poll(&mut self, now: Millis) -> bool {
        let mut sampled = false;
        if now >= self.next_cpu {
            self.sample_cpu();
            self.next_cpu = now + self.cpu_interval;
            sampled = true;
        }
        if now >= self.next_memory {
            self.sample_memory();
            self.next_memory = now + self.memory_interval;
            sampled = true;
        }
        if sampled {
            self.sampled_at = now;
        }
        sampled
    }

    /// Sample both metrics immediately, ignoring the intervals.
    pub fn sample_now(&mut self, now: Millis) {
        self.sample_cpu();
        self.sample_memory();
        self.next_cpu = now + self.cpu_interval;
        self.next_memory = now + self.memory_interval;
        self.sampled_at = now;
    }

    fn sample_cpu(&mut self) {
        let Some(counters) = self.probe.cpu_counters() else { return };
        if let Some(busy) = self.baseline.and_then(|b| counters.busy_percent_since(&b)) {
            if self.window.len() == self.window_len {
                self.window.pop_front();
            }
            self.window.push_back(busy);
        }
        self.baseline = Some(counters);
    }

    fn sample_memory(&mut self) {
        if let Some(m) = self.probe.memory_percent() {
            self.memory_percent = m;
        }
    }

    pub fn cpu_percent(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    pub fn reading(&self) -> TelemetryReading {
        TelemetryReading {
            cpu_percent: self.cpu_percent(),
            memory_percent: self.memory_percent,
            cpu_samples: self.window.len(),
            sampled_at: self.sampled_at,
        }
    }

    /// Forget the CPU window (e.g. after self-healing) so recovery is judged
    /// on fresh samples.
    pub fn reset_window(&mut self) {
        self.window.clear();
    }
}
