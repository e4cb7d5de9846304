//! Health classification and the shared `ResourceHealth` snapshot.

use std::fmt;

use serde::Serialize;

use hive_core::Millis;

/// Ordinal; `Ord` follows declaration order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    #[default]
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Classify one metric: `< warning` healthy, `> critical` critical,
    /// otherwise warning.
    pub fn classify(percent: f64, warning: f32, critical: f32) -> HealthStatus {
        if percent > f64::from(critical) {
            HealthStatus::Critical
        } else if percent >= f64::from(warning) {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Healthy  => "HEALTHY",
            HealthStatus::Warning  => "WARNING",
            HealthStatus::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named resource-usage profile.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatingMode {
    Eco,
    #[default]
    Normal,
    Performance,
}

impl OperatingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            OperatingMode::Eco         => "ECO",
            OperatingMode::Normal      => "NORMAL",
            OperatingMode::Performance => "PERFORMANCE",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multiplier on the mode's tick interval.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Throttle {
    #[default]
    Off,
    /// Engaged on CRITICAL: ×2.
    Hard,
    /// Held during self-healing: ×4.
    Max,
}

impl Throttle {
    #[inline]
    pub fn multiplier(self) -> u32 {
        match self {
            Throttle::Off  => 1,
            Throttle::Hard => 2,
            Throttle::Max  => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Throttle::Off  => "OFF",
            Throttle::Hard => "HARD",
            Throttle::Max  => "MAX",
        }
    }
}

impl fmt::Display for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide health snapshot.  Only the governor writes it; everyone else
/// gets a copy.
#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize)]
pub struct ResourceHealth {
    pub status: HealthStatus,
    pub memory_percent: f64,
    pub cpu_percent: f64,
    pub mode: OperatingMode,
    pub throttle: Throttle,
    pub consecutive_unhealthy: u32,
    pub self_healing: bool,
    pub last_check: Millis,
}

impl ResourceHealth {
    #[inline]
    pub fn is_throttled(&self) -> bool {
        self.throttle != Throttle::Off
    }
}
