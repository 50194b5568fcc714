//! Core data structures: tyre predictions, stints, strategies and search state.
//!
//! All types are plain values owned by the request that created them. The
//! prediction list is read-only for the whole search; [`SearchState`] and
//! [`StintDecision`] only live inside a single solver run.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::PolicyError;

/// Predicted pace of one compound for a given circuit and conditions.
///
/// Lap `i` of a stint (0-indexed) costs `base_time + i * degradation_rate`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TyrePrediction {
    pub compound: String,
    /// Seconds for the first lap on fresh tyres.
    pub base_time: f64,
    /// Seconds lost per additional lap on the same set.
    pub degradation_rate: f64,
}

impl TyrePrediction {
    pub fn new(compound: impl Into<String>, base_time: f64, degradation_rate: f64) -> Self {
        Self {
            compound: compound.into(),
            base_time,
            degradation_rate,
        }
    }
}

/// A contiguous run of laps on one compound. Laps are 1-based and inclusive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stint {
    pub compound: String,
    pub start_lap: u32,
    pub end_lap: u32,
    pub lap_count: u32,
}

impl Stint {
    /// Build a stint covering `start_lap..=end_lap`. Requires `end_lap >= start_lap`.
    pub fn new(compound: impl Into<String>, start_lap: u32, end_lap: u32) -> Self {
        debug_assert!(end_lap >= start_lap, "empty stint {start_lap}..={end_lap}");
        Self {
            compound: compound.into(),
            start_lap,
            end_lap,
            lap_count: end_lap - start_lap + 1,
        }
    }
}

/// A complete race plan: ordered stints covering laps `1..=total_laps`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RaceStrategy {
    /// Total race time in seconds, pit losses included.
    pub total_time: f64,
    pub pit_stop_count: u32,
    pub stints: Vec<Stint>,
}

impl RaceStrategy {
    pub fn new(total_time: f64, stints: Vec<Stint>) -> Self {
        Self {
            total_time,
            pit_stop_count: stints.len().saturating_sub(1) as u32,
            stints,
        }
    }

    /// Number of distinct compounds across all stints.
    pub fn distinct_compounds(&self) -> usize {
        let mut seen: Vec<&str> = Vec::with_capacity(self.stints.len());
        for stint in &self.stints {
            if !seen.contains(&stint.compound.as_str()) {
                seen.push(&stint.compound);
            }
        }
        seen.len()
    }
}

/// Solver state S = (lap, used_mask).
///
/// - `lap`: laps completed so far, `0..=total_laps`
/// - `used_mask`: compounds that appeared in the completed stints
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SearchState {
    pub lap: u32,
    pub used_mask: CompoundMask,
}

impl SearchState {
    #[inline(always)]
    pub fn new(lap: u32, used_mask: CompoundMask) -> Self {
        Self { lap, used_mask }
    }
}

/// Best move recorded for a state: drive `laps` laps on compound `compound`
/// (index into the prediction list), reaching `next_mask`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StintDecision {
    pub compound: usize,
    pub laps: u32,
    pub next_mask: CompoundMask,
}

/// Tunable search knobs.
///
/// | Field | Default | Meaning |
/// |-------|---------|---------|
/// | `min_stint_laps` | 5 | shortest stint the solver considers |
/// | `stint_step` | 1 | increment between candidate stint lengths |
/// | `max_strategies` | 3 | strategies returned after ranking |
/// | `dedup_resolution` | 1.0 | width in seconds of the dedup bucket |
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchPolicy {
    pub min_stint_laps: u32,
    pub stint_step: u32,
    pub max_strategies: usize,
    pub dedup_resolution: f64,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            min_stint_laps: DEFAULT_MIN_STINT_LAPS,
            stint_step: DEFAULT_STINT_STEP,
            max_strategies: DEFAULT_MAX_STRATEGIES,
            dedup_resolution: DEFAULT_DEDUP_RESOLUTION,
        }
    }
}

impl SearchPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.min_stint_laps == 0 {
            return Err(PolicyError::ZeroValue {
                field: "min_stint_laps",
            });
        }
        if self.stint_step == 0 {
            return Err(PolicyError::ZeroValue {
                field: "stint_step",
            });
        }
        if self.max_strategies == 0 {
            return Err(PolicyError::ZeroValue {
                field: "max_strategies",
            });
        }
        if !self.dedup_resolution.is_finite() || self.dedup_resolution <= 0.0 {
            return Err(PolicyError::InvalidResolution {
                value: self.dedup_resolution,
            });
        }
        Ok(())
    }

    /// Copy with out-of-range values replaced by the nearest usable ones.
    pub fn sanitized(&self) -> Self {
        Self {
            min_stint_laps: self.min_stint_laps.max(1),
            stint_step: self.stint_step.max(1),
            max_strategies: self.max_strategies.max(1),
            dedup_resolution: if self.dedup_resolution.is_finite() && self.dedup_resolution > 0.0
            {
                self.dedup_resolution
            } else {
                DEFAULT_DEDUP_RESOLUTION
            },
        }
    }
}

/// Predictions for every compound at one circuit and set of conditions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionSet {
    pub circuit: String,
    pub predictions: Vec<TyrePrediction>,
}

/// An archived strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedStrategy {
    pub id: u64,
    pub circuit: String,
    pub total_time: f64,
    pub pit_stops: u32,
    pub stints_description: String,
    /// `dd-mm-YYYY HH:MM`, local time.
    pub created_at: String,
}
