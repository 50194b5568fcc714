//! Request validation and the glue between callers and the search engine.
//!
//! The engine trusts its input; everything arriving from outside goes through
//! these checks first.

use std::collections::HashSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::RequestError;
use crate::history::{describe_stints, NewSavedStrategy};
use crate::predictions::{PredictionQuery, PredictionSource};
use crate::strategy_search::compute_strategies_until;
use crate::types::{PredictionSet, RaceStrategy, SearchPolicy, TyrePrediction};

/// Body of `POST /api/strategy`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StrategyRequest {
    pub total_laps: i64,
    pub tyres: Vec<TyrePrediction>,
}

/// Accept `1..=MAX_RACE_LAPS`.
pub fn validate_laps(total_laps: i64) -> Result<u32, RequestError> {
    if total_laps < 1 || total_laps > MAX_RACE_LAPS as i64 {
        return Err(RequestError::LapsOutOfRange {
            value: total_laps,
            max: MAX_RACE_LAPS,
        });
    }
    Ok(total_laps as u32)
}

/// Non-empty, at most [`MAX_REQUEST_COMPOUNDS`], unique non-empty names,
/// positive base times, non-negative degradation.
pub fn validate_tyres(tyres: &[TyrePrediction]) -> Result<(), RequestError> {
    if tyres.is_empty() {
        return Err(RequestError::NoTyres);
    }
    if tyres.len() > MAX_REQUEST_COMPOUNDS {
        return Err(RequestError::TooManyCompounds {
            value: tyres.len(),
            max: MAX_REQUEST_COMPOUNDS,
        });
    }

    let mut seen = HashSet::with_capacity(tyres.len());
    for tyre in tyres {
        if tyre.compound.trim().is_empty() {
            return Err(RequestError::EmptyCompound);
        }
        if !seen.insert(tyre.compound.as_str()) {
            return Err(RequestError::DuplicateCompound(tyre.compound.clone()));
        }
        if !tyre.base_time.is_finite() || tyre.base_time <= 0.0 {
            return Err(RequestError::InvalidBaseTime {
                compound: tyre.compound.clone(),
                value: tyre.base_time,
            });
        }
        if !tyre.degradation_rate.is_finite() || tyre.degradation_rate < 0.0 {
            return Err(RequestError::InvalidDegradation {
                compound: tyre.compound.clone(),
                value: tyre.degradation_rate,
            });
        }
    }
    Ok(())
}

fn search_before(
    total_laps: u32,
    tyres: &[TyrePrediction],
    policy: &SearchPolicy,
    deadline: Instant,
) -> Result<Vec<RaceStrategy>, RequestError> {
    compute_strategies_until(total_laps, tyres, policy, deadline).ok_or(RequestError::SearchTimedOut)
}

/// Validate an explicit request and run the search, giving up at `deadline`.
pub fn compute_strategy_response(
    req: &StrategyRequest,
    policy: &SearchPolicy,
    deadline: Instant,
) -> Result<Vec<RaceStrategy>, RequestError> {
    let total_laps = validate_laps(req.total_laps)?;
    validate_tyres(&req.tyres)?;
    search_before(total_laps, &req.tyres, policy, deadline)
}

/// Look up predictions for the conditions, then run the search.
pub fn compute_strategies_for_conditions(
    source: &dyn PredictionSource,
    query: &PredictionQuery,
    total_laps: i64,
    policy: &SearchPolicy,
    deadline: Instant,
) -> Result<(PredictionSet, Vec<RaceStrategy>), RequestError> {
    let total_laps = validate_laps(total_laps)?;
    let set = source
        .predict(query)
        .ok_or_else(|| RequestError::UnknownCircuit(query.circuit.clone()))?;
    validate_tyres(&set.predictions)?;
    let strategies = search_before(total_laps, &set.predictions, policy, deadline)?;
    Ok((set, strategies))
}

/// Archive record for a computed strategy.
pub fn saved_from_strategy(circuit: &str, strategy: &RaceStrategy) -> NewSavedStrategy {
    NewSavedStrategy {
        circuit: circuit.to_string(),
        total_time: strategy.total_time,
        pit_stops: strategy.pit_stop_count,
        stints_description: describe_stints(&strategy.stints),
    }
}
