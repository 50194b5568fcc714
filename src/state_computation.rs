//! DP solver: minimal time to finish the race from S = (lap, used_mask).
//!
//! Recurrence, with `pit(lap) = 0` at the start and [`PIT_STOP_LOSS`] otherwise:
//!
//! ```text
//! T(total, m) = 0 if |m| >= 2 else INF
//! T(lap, m)   = min over compound c, length L of
//!               cost(c, L) + pit(lap) + T(lap + L, m | bit(c))
//! ```
//!
//! States are solved on demand and memoized in a [`SolverCache`] owned by the
//! caller. A cache belongs to exactly one run: the diversifier builds a fresh
//! one for every seed, so concurrent runs never share mutable state.
//! Recursion depth is bounded by `total_laps / min_stint_laps`.

use std::collections::HashMap;

use crate::constants::*;
use crate::race_mechanics::{is_legal, stint_time};
use crate::types::{SearchPolicy, SearchState, StintDecision, TyrePrediction};

/// Immutable inputs of one optimization request plus precomputed stint costs.
pub struct RaceContext<'a> {
    pub total_laps: u32,
    pub tyres: &'a [TyrePrediction],
    pub policy: SearchPolicy,
    /// `stint_costs[c][l]` = [`stint_time`]`(tyres[c], l)` for `l` in `0..=total_laps`.
    stint_costs: Vec<Vec<f64>>,
}

impl<'a> RaceContext<'a> {
    /// Compounds beyond [`MAX_COMPOUNDS`] do not fit the usage mask and are ignored.
    pub fn new(total_laps: u32, tyres: &'a [TyrePrediction], policy: &SearchPolicy) -> Self {
        let tyres = if tyres.len() > MAX_COMPOUNDS {
            tracing::warn!(
                supplied = tyres.len(),
                kept = MAX_COMPOUNDS,
                "too many compounds, ignoring the tail"
            );
            &tyres[..MAX_COMPOUNDS]
        } else {
            tyres
        };

        let stint_costs = tyres
            .iter()
            .map(|tyre| {
                // Same accumulation order as stint_time, so entries match it exactly.
                let mut costs = Vec::with_capacity(total_laps as usize + 1);
                let mut total = 0.0;
                let mut lap_time = tyre.base_time;
                costs.push(total);
                for _ in 0..total_laps {
                    total += lap_time;
                    lap_time += tyre.degradation_rate;
                    costs.push(total);
                }
                costs
            })
            .collect();

        Self {
            total_laps,
            tyres,
            policy: policy.sanitized(),
            stint_costs,
        }
    }

    /// Cost of `laps` laps on compound `compound`.
    #[inline(always)]
    pub fn stint_cost(&self, compound: usize, laps: u32) -> f64 {
        match self.stint_costs[compound].get(laps as usize) {
            Some(&cost) => cost,
            None => stint_time(&self.tyres[compound], laps),
        }
    }

    /// Candidate stint lengths starting after `lap` completed laps.
    ///
    /// `min_stint_laps`, `min_stint_laps + stint_step`, ... up to the remaining
    /// laps, plus the remaining laps themselves so a stepped search can always
    /// run to the flag.
    pub fn stint_lengths(&self, lap: u32) -> impl Iterator<Item = u32> {
        let remaining = self.total_laps.saturating_sub(lap);
        let min = self.policy.min_stint_laps;
        let step = self.policy.stint_step;
        let to_flag = remaining >= min && (remaining - min) % step != 0;
        (min..=remaining)
            .step_by(step as usize)
            .chain(to_flag.then_some(remaining))
    }
}

/// Solved value of a state together with the move that achieves it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateEntry {
    pub time: f64,
    pub decision: Option<StintDecision>,
}

/// Memo table for one solver run, keyed by [`SearchState`].
#[derive(Debug, Default)]
pub struct SolverCache {
    entries: HashMap<SearchState, StateEntry>,
}

impl SolverCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries so the cache can be reused for another run.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, state: &SearchState) -> Option<&StateEntry> {
        self.entries.get(state)
    }

    /// Best decision recorded for `state`, if the state was solved and has one.
    pub fn decision(&self, state: &SearchState) -> Option<StintDecision> {
        self.entries.get(state).and_then(|e| e.decision)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Minimal time to finish the race from `state`, or [`INFEASIBLE_TIME`] when
/// no legal completion exists.
///
/// Ties keep the first candidate found: compounds in prediction order, then
/// stint lengths ascending.
pub fn solve_state(race: &RaceContext, cache: &mut SolverCache, state: SearchState) -> f64 {
    if state.lap >= race.total_laps {
        return if is_legal(state.used_mask) {
            0.0
        } else {
            INFEASIBLE_TIME
        };
    }

    if let Some(entry) = cache.get(&state) {
        return entry.time;
    }

    let pit_cost = if state.lap == 0 { 0.0 } else { PIT_STOP_LOSS };
    let mut min_time = INFEASIBLE_TIME;
    let mut best: Option<StintDecision> = None;

    for compound in 0..race.tyres.len() {
        let next_mask = state.used_mask | compound_bit(compound);
        for laps in race.stint_lengths(state.lap) {
            let rest = solve_state(race, cache, SearchState::new(state.lap + laps, next_mask));
            if !rest.is_finite() {
                continue;
            }
            let total = race.stint_cost(compound, laps) + pit_cost + rest;
            if total < min_time {
                min_time = total;
                best = Some(StintDecision {
                    compound,
                    laps,
                    next_mask,
                });
            }
        }
    }

    cache.entries.insert(
        state,
        StateEntry {
            time: min_time,
            decision: best,
        },
    );
    min_time
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tyres() -> Vec<TyrePrediction> {
        vec![
            TyrePrediction::new("SOFT", 90.0, 0.10),
            TyrePrediction::new("MEDIUM", 91.0, 0.06),
            TyrePrediction::new("HARD", 92.5, 0.02),
        ]
    }

    fn policy(min_stint_laps: u32, stint_step: u32) -> SearchPolicy {
        SearchPolicy {
            min_stint_laps,
            stint_step,
            ..SearchPolicy::default()
        }
    }

    #[test]
    fn test_stint_costs_match_stint_time() {
        let t = tyres();
        let race = RaceContext::new(60, &t, &SearchPolicy::default());
        for c in 0..t.len() {
            for l in 0..=60 {
                assert_eq!(race.stint_cost(c, l), stint_time(&t[c], l));
            }
        }
        // Beyond the table falls back to direct summation.
        assert_eq!(race.stint_cost(0, 70), stint_time(&t[0], 70));
    }

    #[test]
    fn test_stint_lengths() {
        let t = tyres();
        let race = RaceContext::new(20, &t, &policy(5, 1));
        assert_eq!(race.stint_lengths(0).collect::<Vec<_>>(), (5..=20).collect::<Vec<_>>());
        assert_eq!(race.stint_lengths(16).count(), 0);
        assert_eq!(race.stint_lengths(15).collect::<Vec<_>>(), vec![5]);

        let stepped = RaceContext::new(20, &t, &policy(5, 4));
        assert_eq!(stepped.stint_lengths(0).collect::<Vec<_>>(), vec![5, 9, 13, 17, 20]);
        assert_eq!(stepped.stint_lengths(3).collect::<Vec<_>>(), vec![5, 9, 13, 17]);
    }

    #[test]
    fn test_terminal_states() {
        let t = tyres();
        let race = RaceContext::new(10, &t, &SearchPolicy::default());
        let mut cache = SolverCache::new();
        assert_eq!(solve_state(&race, &mut cache, SearchState::new(10, 0b011)), 0.0);
        assert_eq!(
            solve_state(&race, &mut cache, SearchState::new(10, 0b001)),
            INFEASIBLE_TIME
        );
        assert!(cache.is_empty(), "terminal states are not cached");
    }

    #[test]
    fn test_single_compound_is_infeasible() {
        let t = vec![TyrePrediction::new("SOFT", 90.0, 0.1)];
        let race = RaceContext::new(30, &t, &SearchPolicy::default());
        let mut cache = SolverCache::new();
        let time = solve_state(&race, &mut cache, SearchState::new(0, 0));
        assert!(!time.is_finite());
        assert_eq!(cache.decision(&SearchState::new(0, 0)), None);
    }

    #[test]
    fn test_remaining_below_min_stint_is_infeasible() {
        let t = tyres();
        let race = RaceContext::new(12, &t, &policy(5, 1));
        let mut cache = SolverCache::new();
        let time = solve_state(&race, &mut cache, SearchState::new(9, 0b001));
        assert_eq!(time, INFEASIBLE_TIME);
    }

    #[test]
    fn test_two_stint_optimum_by_hand() {
        // 10 laps, min stint 5 => only 5+5 splits with two different compounds.
        let t = vec![
            TyrePrediction::new("A", 100.0, 0.0),
            TyrePrediction::new("B", 101.0, 0.0),
        ];
        let race = RaceContext::new(10, &t, &policy(5, 1));
        let mut cache = SolverCache::new();
        let time = solve_state(&race, &mut cache, SearchState::new(0, 0));
        assert!((time - (500.0 + PIT_STOP_LOSS + 505.0)).abs() < 1e-9);

        let first = cache.decision(&SearchState::new(0, 0)).unwrap();
        assert_eq!(first.compound, 0);
        assert_eq!(first.laps, 5);
        assert_eq!(first.next_mask, 0b01);
    }

    #[test]
    fn test_pit_loss_charged_after_start() {
        let t = vec![
            TyrePrediction::new("A", 100.0, 0.0),
            TyrePrediction::new("B", 100.0, 0.0),
        ];
        let race = RaceContext::new(10, &t, &policy(5, 1));
        let mut cache = SolverCache::new();
        // Mid-race state: one stint of 5 laps plus a stop.
        let time = solve_state(&race, &mut cache, SearchState::new(5, 0b01));
        assert!((time - (PIT_STOP_LOSS + 500.0)).abs() < 1e-9);
    }

    #[test]
    fn test_cache_reuse_is_consistent() {
        let t = tyres();
        let race = RaceContext::new(40, &t, &SearchPolicy::default());
        let mut cache = SolverCache::new();
        let first = solve_state(&race, &mut cache, SearchState::new(0, 0));
        let cached = cache.len();
        let second = solve_state(&race, &mut cache, SearchState::new(0, 0));
        assert_eq!(first, second);
        assert_eq!(cache.len(), cached);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(solve_state(&race, &mut cache, SearchState::new(0, 0)), first);
    }
}
