//! Path reconstruction: replay the solver's recorded decisions as stints.

use crate::state_computation::{RaceContext, SolverCache};
use crate::types::{SearchState, Stint};

/// Walk the best decisions from `start` to the end of the race.
///
/// Returns `None` if some state on the path was never solved (or has no legal
/// move). The time of the returned segment equals the cached value of
/// `start`; any cost incurred before `start.lap` is the caller's.
pub fn reconstruct_stints(
    race: &RaceContext,
    cache: &SolverCache,
    start: SearchState,
) -> Option<Vec<Stint>> {
    let mut stints = Vec::new();
    let mut state = start;

    while state.lap < race.total_laps {
        let decision = cache.decision(&state)?;
        let tyre = race.tyres.get(decision.compound)?;
        stints.push(Stint::new(
            tyre.compound.clone(),
            state.lap + 1,
            state.lap + decision.laps,
        ));
        state = SearchState::new(state.lap + decision.laps, decision.next_mask);
    }

    Some(stints)
}
