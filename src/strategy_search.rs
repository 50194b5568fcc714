//! Strategy diversifier: top-K distinct strategies over all first-stint seeds.
//!
//! A single DP run yields one optimum. To surface alternatives (one stop vs.
//! two, different opening compound) every (compound, first-stint length) pair
//! is committed as a seed and the solver finishes the race from there:
//!
//! 1. fresh [`SolverCache`] per seed
//! 2. `first = cost(c, L1)`, `rest = T(L1, bit(c))`
//! 3. feasible seeds are reconstructed into a full [`RaceStrategy`]
//!
//! Candidates are sorted by total time and deduplicated by time bucket
//! (`floor(total_time / dedup_resolution)`), keeping the first
//! `max_strategies`.
//!
//! Seeds are independent and evaluated in parallel with rayon. Results are
//! collected in seed order and sorted stably, so output is deterministic.
//! With `RAYON_NUM_THREADS=1` seeds are evaluated one at a time.
//!
//! [`compute_strategies_until`] checks a deadline before each seed and gives
//! up once it has passed, so a caller can bound how long the pool stays busy.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::constants::*;
use crate::reconstruction::reconstruct_stints;
use crate::state_computation::{solve_state, RaceContext, SolverCache};
use crate::types::{RaceStrategy, SearchPolicy, SearchState, Stint, TyrePrediction};

/// Top strategies for `total_laps` under the default [`SearchPolicy`].
pub fn compute_strategies(total_laps: u32, tyres: &[TyrePrediction]) -> Vec<RaceStrategy> {
    compute_strategies_with_policy(total_laps, tyres, &SearchPolicy::default())
}

/// Top strategies for `total_laps`, ascending by total time, at most
/// `policy.max_strategies` long. Empty when `tyres` is empty or no legal
/// strategy exists.
pub fn compute_strategies_with_policy(
    total_laps: u32,
    tyres: &[TyrePrediction],
    policy: &SearchPolicy,
) -> Vec<RaceStrategy> {
    search(total_laps, tyres, policy, None).unwrap_or_default()
}

/// Like [`compute_strategies_with_policy`], but returns `None` when `deadline`
/// passes before every seed has been evaluated.
pub fn compute_strategies_until(
    total_laps: u32,
    tyres: &[TyrePrediction],
    policy: &SearchPolicy,
    deadline: Instant,
) -> Option<Vec<RaceStrategy>> {
    search(total_laps, tyres, policy, Some(deadline))
}

fn search(
    total_laps: u32,
    tyres: &[TyrePrediction],
    policy: &SearchPolicy,
    deadline: Option<Instant>,
) -> Option<Vec<RaceStrategy>> {
    if tyres.is_empty() || total_laps < 2 {
        return Some(Vec::new());
    }

    let start = Instant::now();
    let race = RaceContext::new(total_laps, tyres, policy);

    let seeds: Vec<(usize, u32)> = (0..race.tyres.len())
        .flat_map(|compound| (1..total_laps).map(move |laps| (compound, laps)))
        .collect();

    let expired = AtomicBool::new(false);
    let candidates: Vec<RaceStrategy> = seeds
        .par_iter()
        .filter_map(|&(compound, laps)| {
            if expired.load(Ordering::Relaxed) {
                return None;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                expired.store(true, Ordering::Relaxed);
                return None;
            }
            run_seed(&race, compound, laps)
        })
        .collect();

    if expired.load(Ordering::Relaxed) {
        tracing::warn!(
            total_laps,
            compounds = race.tyres.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "strategy search deadline passed"
        );
        return None;
    }

    let pooled = candidates.len();
    let ranked = rank_candidates(candidates, &race.policy);

    tracing::debug!(
        total_laps,
        compounds = race.tyres.len(),
        seeds = seeds.len(),
        pooled,
        returned = ranked.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "strategy search finished"
    );
    Some(ranked)
}

/// One diversifier run: commit the opening stint, let the solver finish.
fn run_seed(race: &RaceContext, compound: usize, first_laps: u32) -> Option<RaceStrategy> {
    let mut cache = SolverCache::new();
    let first_time = race.stint_cost(compound, first_laps);
    let rest_start = SearchState::new(first_laps, compound_bit(compound));

    let rest_time = solve_state(race, &mut cache, rest_start);
    if !rest_time.is_finite() {
        return None;
    }

    let rest = reconstruct_stints(race, &cache, rest_start)?;
    let mut stints = Vec::with_capacity(rest.len() + 1);
    stints.push(Stint::new(
        race.tyres[compound].compound.clone(),
        1,
        first_laps,
    ));
    stints.extend(rest);

    Some(RaceStrategy::new(first_time + rest_time, stints))
}

/// Sort ascending by total time and keep the first strategy of each time
/// bucket until `policy.max_strategies` are kept. Non-finite times are dropped.
pub fn rank_candidates(mut candidates: Vec<RaceStrategy>, policy: &SearchPolicy) -> Vec<RaceStrategy> {
    let policy = policy.sanitized();
    candidates.retain(|s| s.total_time.is_finite());
    candidates.sort_by(|a, b| a.total_time.total_cmp(&b.total_time));

    let mut seen_buckets: HashSet<i64> = HashSet::new();
    let mut ranked = Vec::with_capacity(policy.max_strategies);
    for strategy in candidates {
        let bucket = (strategy.total_time / policy.dedup_resolution).floor() as i64;
        if seen_buckets.insert(bucket) {
            ranked.push(strategy);
            if ranked.len() >= policy.max_strategies {
                break;
            }
        }
    }
    ranked
}
