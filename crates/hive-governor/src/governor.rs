//! The resource governor: the only writer of [`ResourceHealth`] and of the
//! operating mode.
//!
//! # Status transitions
//!
//! Memory and CPU are classified independently and the worse class wins.
//! Status rises as soon as a threshold is crossed but falls only when both
//! metrics are back below the WARNING threshold, straight to HEALTHY.
//!
//! # Responses
//!
//! | Status   | Mode | Throttle | Actions                                         |
//! |----------|------|----------|-------------------------------------------------|
//! | HEALTHY  | NORMAL, or PERFORMANCE with headroom | OFF | `Recovered` on the way down |
//! | WARNING  | ECO  | OFF      | `ReclaimMemory` if memory is the cause          |
//! | CRITICAL | ECO  | HARD     | `EvictDecisionCache`, `ReclaimMemory` if memory |
//!
//! After `max_unhealthy_checks` consecutive unhealthy checks the governor
//! self-heals: aggressive reclamation, cache eviction and MAX throttle, then a
//! re-check after the cooldown.  The system stays degraded until a re-check
//! finds it healthy.

use std::time::Duration;

use log::{debug, error, info, warn};

use hive_core::{Millis, ResourceConfig, TickConfig};

use crate::{HealthStatus, OperatingMode, ResourceHealth, TelemetryReading, Throttle};

/// Work the governor asks the scheduler to carry out.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GovernorAction {
    ReclaimMemory { aggressive: bool },
    EvictDecisionCache,
    EngageThrottle(Throttle),
    SelfHeal,
    Recovered,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GovernorReport {
    pub health: ResourceHealth,
    pub actions: Vec<GovernorAction>,
}

pub struct Governor {
    cfg: ResourceConfig,
    ticks: TickConfig,
    health: ResourceHealth,
    next_check: Millis,
    heal_recheck_at: Option<Millis>,
}

impl Governor {
    pub fn new(cfg: ResourceConfig, ticks: TickConfig) -> Self {
        Self {
            cfg,
            ticks,
            health: ResourceHealth::default(),
            next_check: Millis(0),
            heal_recheck_at: None,
        }
    }

    /// Read-only copy of the current health.
    pub fn health(&self) -> ResourceHealth {
        self.health
    }

    pub fn mode(&self) -> OperatingMode {
        self.health.mode
    }

    /// A health check (or a self-healing re-check) is due.
    pub fn is_due(&self, now: Millis) -> bool {
        now >= self.next_check || self.heal_recheck_at.is_some_and(|at| now >= at)
    }

    // ── Pacing ────────────────────────────────────────────────────────────

    /// Mode interval times the throttle multiplier.
    pub fn tick_interval(&self) -> Duration {
        let base = match self.health.mode {
            OperatingMode::Eco         => self.ticks.eco_interval_ms,
            OperatingMode::Normal      => self.ticks.normal_interval_ms,
            OperatingMode::Performance => self.ticks.performance_interval_ms,
        };
        Duration::from_millis(base.saturating_mul(u64::from(self.health.throttle.multiplier())))
    }

    /// Oracle batch size for the current mode; halved while throttled.
    pub fn batch_size(&self) -> usize {
        let base = match self.health.mode {
            OperatingMode::Eco         => self.ticks.eco_batch_size,
            OperatingMode::Normal      => self.ticks.normal_batch_size,
            OperatingMode::Performance => self.ticks.performance_batch_size,
        };
        if self.health.is_throttled() { (base / 2).max(1) } else { base }
    }

    // ── Evaluation ────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, reading: TelemetryReading, now: Millis) -> GovernorReport {
        let mut actions = Vec::new();
        let warning = self.cfg.warning_percent;
        let critical = self.cfg.critical_percent;

        let memory_class = HealthStatus::classify(reading.memory_percent, warning, critical);
        let cpu_class = HealthStatus::classify(reading.cpu_percent, warning, critical);
        let raw = memory_class.max(cpu_class);

        let previous = self.health.status;
        let status = if raw > previous || raw == HealthStatus::Healthy { raw } else { previous };

        self.health.memory_percent = reading.memory_percent;
        self.health.cpu_percent = reading.cpu_percent;
        self.health.last_check = now;
        self.health.status = status;
        self.health.consecutive_unhealthy = match status {
            HealthStatus::Healthy => 0,
            _ => self.health.consecutive_unhealthy.saturating_add(1),
        };
        self.next_check = now + self.cfg.health_check_interval();

        if status != previous {
            log_transition(previous, status, &reading);
        }

        if self.health.self_healing {
            self.continue_self_heal(now, &mut actions);
        } else {
            self.respond(status, previous, memory_class, reading, &mut actions);
            if self.health.consecutive_unhealthy >= self.cfg.max_unhealthy_checks {
                self.begin_self_heal(now, &mut actions);
            }
        }

        GovernorReport { health: self.health, actions }
    }

    fn respond(
        &mut self,
        status:       HealthStatus,
        previous:     HealthStatus,
        memory_class: HealthStatus,
        reading:      TelemetryReading,
        actions:      &mut Vec<GovernorAction>,
    ) {
        match status {
            HealthStatus::Healthy => {
                if previous != HealthStatus::Healthy {
                    actions.push(GovernorAction::Recovered);
                }
                self.set_throttle(Throttle::Off, actions);
                self.health.mode = self.healthy_mode(reading);
            }
            HealthStatus::Warning => {
                self.health.mode = OperatingMode::Eco;
                self.set_throttle(Throttle::Off, actions);
                if memory_class >= HealthStatus::Warning {
                    actions.push(GovernorAction::ReclaimMemory { aggressive: false });
                }
            }
            HealthStatus::Critical => {
                self.health.mode = OperatingMode::Eco;
                actions.push(GovernorAction::EvictDecisionCache);
                self.set_throttle(Throttle::Hard, actions);
                if memory_class >= HealthStatus::Warning {
                    actions.push(GovernorAction::ReclaimMemory { aggressive: false });
                }
            }
        }
    }

    fn healthy_mode(&self, reading: TelemetryReading) -> OperatingMode {
        let headroom = f64::from(self.cfg.performance_below_percent);
        if self.cfg.allow_performance && reading.cpu_percent < headroom && reading.memory_percent < headroom {
            OperatingMode::Performance
        } else {
            OperatingMode::Normal
        }
    }

    fn set_throttle(&mut self, throttle: Throttle, actions: &mut Vec<GovernorAction>) {
        if self.health.throttle != throttle {
            self.health.throttle = throttle;
            if throttle != Throttle::Off {
                actions.push(GovernorAction::EngageThrottle(throttle));
            }
        }
    }

    fn begin_self_heal(&mut self, now: Millis, actions: &mut Vec<GovernorAction>) {
        warn!(
            "self-healing after {} consecutive unhealthy checks (status {})",
            self.health.consecutive_unhealthy, self.health.status,
        );
        self.health.self_healing = true;
        self.health.mode = OperatingMode::Eco;
        self.heal_recheck_at = Some(now + self.cfg.self_heal_cooldown());
        actions.push(GovernorAction::SelfHeal);
        actions.push(GovernorAction::ReclaimMemory { aggressive: true });
        actions.push(GovernorAction::EvictDecisionCache);
        self.set_throttle(Throttle::Max, actions);
    }

    fn continue_self_heal(&mut self, now: Millis, actions: &mut Vec<GovernorAction>) {
        let Some(recheck_at) = self.heal_recheck_at else { return };
        if now < recheck_at {
            return;
        }
        if self.health.status == HealthStatus::Healthy {
            info!("self-healing finished; resources recovered");
            self.health.self_healing = false;
            self.heal_recheck_at = None;
            self.health.mode = OperatingMode::Normal;
            self.set_throttle(Throttle::Off, actions);
            actions.push(GovernorAction::Recovered);
        } else {
            debug!("self-healing re-check: still {}; staying degraded", self.health.status);
            self.heal_recheck_at = Some(now + self.cfg.self_heal_cooldown());
            actions.push(GovernorAction::ReclaimMemory { aggressive: true });
        }
    }
}

fn log_transition(from: HealthStatus, to: HealthStatus, r: &TelemetryReading) {
    let (cpu, mem) = (r.cpu_percent, r.memory_percent);
    match to {
        HealthStatus::Healthy  => info!("resource health {from} -> {to} (cpu {cpu:.1}%, mem {mem:.1}%)"),
        HealthStatus::Warning  => warn!("resource health {from} -> {to} (cpu {cpu:.1}%, mem {mem:.1}%)"),
        HealthStatus::Critical => error!("resource health {from} -> {to} (cpu {cpu:.1}%, mem {mem:.1}%)"),
    }
}
