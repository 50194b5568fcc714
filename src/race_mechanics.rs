//! Race rules: stint cost under linear degradation and the two-compound rule.

use crate::constants::*;
use crate::types::{Stint, TyrePrediction};

/// Time to drive `laps` consecutive laps on `tyre`.
///
/// Sums `base_time + i * degradation_rate` lap by lap. `laps == 0` costs 0.
pub fn stint_time(tyre: &TyrePrediction, laps: u32) -> f64 {
    let mut total = 0.0;
    let mut lap_time = tyre.base_time;
    for _ in 0..laps {
        total += lap_time;
        lap_time += tyre.degradation_rate;
    }
    total
}

/// True iff `used_mask` contains at least [`MIN_DISTINCT_COMPOUNDS`] compounds.
#[inline(always)]
pub fn is_legal(used_mask: CompoundMask) -> bool {
    used_mask.count_ones() >= MIN_DISTINCT_COMPOUNDS
}

/// Re-evaluate a stint list against `tyres`: stint costs plus one
/// [`PIT_STOP_LOSS`] per stop. `None` if a stint names an unknown compound.
pub fn race_time(tyres: &[TyrePrediction], stints: &[Stint]) -> Option<f64> {
    let mut total = 0.0;
    for (i, stint) in stints.iter().enumerate() {
        let tyre = tyres.iter().find(|t| t.compound == stint.compound)?;
        if i > 0 {
            total += PIT_STOP_LOSS;
        }
        total += stint_time(tyre, stint.lap_count);
    }
    Some(total)
}
