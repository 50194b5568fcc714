//! # Pit Strategy: Race Pit-Stop Strategy Optimiser
//!
//! Given a race length and, per tyre compound, a predicted base lap time and
//! linear degradation rate, finds the stint plans that minimise total race
//! time while using at least two distinct compounds.
//!
//! ## Algorithm overview
//!
//! | Stage | Rust module | Description |
//! |-------|-------------|-------------|
//! | Stint cost | [`race_mechanics`] | `cost(c, L)` = sum of `base + i * deg` over the stint; two-compound rule |
//! | DP solver | [`state_computation`] | Memoized search over S = (lap, used_mask), one cache per run |
//! | Reconstruction | [`reconstruction`] | Replay recorded best decisions into ordered stints |
//! | Diversifier | [`strategy_search`] | Seed every (compound, first-stint length), rank, dedup by time bucket |
//!
//! ## State representation
//!
//! A search state S = (lap, m) where:
//! - `lap` ∈ [0, total_laps]: laps completed
//! - `m`: bitmask of compounds used so far (bit i = i-th prediction)
//!
//! Terminal states (`lap == total_laps`) are worth 0 if `m` has at least two
//! bits set and infinity otherwise, so illegal one-compound plans never win.
//! A pit stop costs [`constants::PIT_STOP_LOSS`] = 20 s, charged on every
//! stint after the first.
//!
//! ## Around the engine
//!
//! - [`predictions`]: tyre-prediction source for a circuit and conditions
//! - [`history`], [`storage`]: saved-strategy archive and JSON files
//! - [`api_computations`], [`server`]: request validation and the axum HTTP API
//! - [`env_config`]: environment configuration, rayon and tracing setup

pub mod api_computations;
pub mod constants;
pub mod env_config;
pub mod error;
pub mod history;
pub mod predictions;
pub mod race_mechanics;
pub mod reconstruction;
pub mod server;
pub mod state_computation;
pub mod storage;
pub mod strategy_search;
pub mod types;
