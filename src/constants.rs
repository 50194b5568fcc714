//! Race constants, search-policy defaults and compound-mask helpers.
//!
//! A usage mask records which compounds have been driven so far: bit `i` is set
//! once the `i`-th entry of the prediction list has appeared in a stint. The
//! mask is a `u32`, so at most [`MAX_COMPOUNDS`] compounds take part in a search.

/// Compound usage bitmask (bit `i` = compound `i` has been used).
pub type CompoundMask = u32;

/// Time lost per pit stop (pit-lane transit + tyre change), in seconds.
/// Charged once per transition between stints, never for the opening stint.
pub const PIT_STOP_LOSS: f64 = 20.0;

/// Sentinel time for unreachable or illegal subtrees. Never returned to callers.
pub const INFEASIBLE_TIME: f64 = f64::INFINITY;

/// Regulations require at least this many distinct compounds per race.
pub const MIN_DISTINCT_COMPOUNDS: u32 = 2;

/// Width of [`CompoundMask`].
pub const MAX_COMPOUNDS: usize = CompoundMask::BITS as usize;

/// Default minimum stint length considered by the solver, in laps.
pub const DEFAULT_MIN_STINT_LAPS: u32 = 5;

/// Default increment between candidate stint lengths, in laps.
pub const DEFAULT_STINT_STEP: u32 = 1;

/// Default number of strategies returned.
pub const DEFAULT_MAX_STRATEGIES: usize = 3;

/// Default dedup bucket width, in seconds.
pub const DEFAULT_DEDUP_RESOLUTION: f64 = 1.0;

/// Longest race accepted by the HTTP layer.
pub const MAX_RACE_LAPS: u32 = 100;

/// Most compounds accepted in a single HTTP request.
pub const MAX_REQUEST_COMPOUNDS: usize = 5;

/// Default wall-clock budget for one HTTP strategy search, in seconds.
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;

/// Bit for the compound at `index` in the prediction list.
#[inline(always)]
pub fn compound_bit(index: usize) -> CompoundMask {
    1 << index
}

/// Test whether compound `index` has been used (bit `index` is set).
#[inline(always)]
pub fn is_compound_used(mask: CompoundMask, index: usize) -> bool {
    (mask & compound_bit(index)) != 0
}
