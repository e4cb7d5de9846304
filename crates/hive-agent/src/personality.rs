//! Personality weights.

use serde::Serialize;

/// Stable character traits, each in `[0, 1]`.
#[derive(Copy, Clone, PartialEq, Debug, Serialize)]
pub struct Personality {
    pub curiosity: f64,
    pub sociability: f64,
    pub diligence: f64,
}

/// Trait value above which a Mind raises an opportunistic thought.
pub const OPPORTUNISM_THRESHOLD: f64 = 0.7;

impl Default for Personality {
    fn default() -> Self {
        Self { curiosity: 0.5, sociability: 0.5, diligence: 0.5 }
    }
}

impl Personality {
    /// Build with every trait clamped into `[0, 1]` (NaN reads as 0.5).
    pub fn new(curiosity: f64, sociability: f64, diligence: f64) -> Self {
        fn unit(v: f64) -> f64 {
            if v.is_nan() { 0.5 } else { v.clamp(0.0, 1.0) }
        }
        Self {
            curiosity:   unit(curiosity),
            sociability: unit(sociability),
            diligence:   unit(diligence),
        }
    }

    #[inline]
    pub fn is_curious(&self) -> bool {
        self.curiosity > OPPORTUNISM_THRESHOLD
    }

    #[inline]
    pub fn is_sociable(&self) -> bool {
        self.sociability > OPPORTUNISM_THRESHOLD
    }

    /// Diligent agents put role work ahead of opportunistic behavior.
    #[inline]
    pub fn work_first(&self) -> bool {
        self.diligence >= self.curiosity.max(self.sociability)
    }
}
