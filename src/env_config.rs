//! Shared environment configuration for the binaries.
//!
//! | Variable | Default | Used for |
//! |----------|---------|----------|
//! | `PIT_STRATEGY_BASE_PATH` | `.` | working directory for data files |
//! | `PIT_STRATEGY_PORT` | 9000 | server port |
//! | `PIT_STRATEGY_PREDICTIONS` | `data/predictions.json` | prediction table |
//! | `PIT_STRATEGY_HISTORY` | `data/history.json` | history archive |
//! | `PIT_STRATEGY_MIN_STINT` | 5 | [`SearchPolicy::min_stint_laps`] |
//! | `PIT_STRATEGY_STINT_STEP` | 1 | [`SearchPolicy::stint_step`] |
//! | `PIT_STRATEGY_TOP_K` | 3 | [`SearchPolicy::max_strategies`] |
//! | `PIT_STRATEGY_DEDUP_SECS` | 1.0 | [`SearchPolicy::dedup_resolution`] |
//! | `PIT_STRATEGY_TIMEOUT_SECS` | 10 | per-request search deadline (server) |
//! | `RAYON_NUM_THREADS` | 8 | seed-evaluation workers (fallback `OMP_NUM_THREADS`) |
//! | `RUST_LOG` | `info` | tracing filter |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::constants::DEFAULT_SEARCH_TIMEOUT_SECS;
use crate::error::PolicyError;
use crate::storage::{HISTORY_FILE_PATH, PREDICTIONS_FILE_PATH};
use crate::types::SearchPolicy;

/// Install the global tracing subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Ignore a subscriber installed earlier in the process.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Read `PIT_STRATEGY_BASE_PATH` (default `"."`) and chdir. Exits on failure.
pub fn init_base_path() -> PathBuf {
    let base_path = std::env::var("PIT_STRATEGY_BASE_PATH").unwrap_or_else(|_| ".".to_string());
    let path = PathBuf::from(&base_path);
    if let Err(e) = std::env::set_current_dir(&base_path) {
        tracing::error!(path = %base_path, error = %e, "failed to change directory");
        std::process::exit(1);
    }
    if let Ok(cwd) = std::env::current_dir() {
        tracing::info!(cwd = %cwd.display(), "working directory");
    }
    path
}

/// Read `RAYON_NUM_THREADS` (fallback `OMP_NUM_THREADS`, default 8) and build
/// the rayon global pool. Tolerates an already-initialized pool.
pub fn init_rayon_threads() -> usize {
    let num_threads = std::env::var("RAYON_NUM_THREADS")
        .or_else(|_| std::env::var("OMP_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8);
    if rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .is_err()
    {
        tracing::debug!("rayon global pool already initialized");
    }
    tracing::info!(num_threads, "rayon threads");
    num_threads
}

/// Read `PIT_STRATEGY_PORT` (default 9000).
pub fn server_port() -> u16 {
    std::env::var("PIT_STRATEGY_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9000)
}

/// Read `PIT_STRATEGY_TIMEOUT_SECS` (default 10, at least 1).
pub fn search_timeout() -> Duration {
    let secs = std::env::var("PIT_STRATEGY_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS)
        .max(1);
    Duration::from_secs(secs)
}

pub fn predictions_path() -> PathBuf {
    std::env::var("PIT_STRATEGY_PREDICTIONS")
        .unwrap_or_else(|_| PREDICTIONS_FILE_PATH.to_string())
        .into()
}

pub fn history_path() -> PathBuf {
    std::env::var("PIT_STRATEGY_HISTORY")
        .unwrap_or_else(|_| HISTORY_FILE_PATH.to_string())
        .into()
}

fn parse_var<T: FromStr>(var: &'static str, value: Option<String>) -> Result<Option<T>, PolicyError> {
    match value {
        None => Ok(None),
        Some(raw) => {
            let parsed = raw.trim().parse();
            match parsed {
                Ok(v) => Ok(Some(v)),
                Err(_) => Err(PolicyError::Unparsable { var, value: raw }),
            }
        }
    }
}

/// Build a [`SearchPolicy`] from a variable lookup, starting from the defaults.
pub fn search_policy_from<F>(lookup: F) -> Result<SearchPolicy, PolicyError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut policy = SearchPolicy::default();
    if let Some(v) = parse_var("PIT_STRATEGY_MIN_STINT", lookup("PIT_STRATEGY_MIN_STINT"))? {
        policy.min_stint_laps = v;
    }
    if let Some(v) = parse_var("PIT_STRATEGY_STINT_STEP", lookup("PIT_STRATEGY_STINT_STEP"))? {
        policy.stint_step = v;
    }
    if let Some(v) = parse_var("PIT_STRATEGY_TOP_K", lookup("PIT_STRATEGY_TOP_K"))? {
        policy.max_strategies = v;
    }
    if let Some(v) = parse_var("PIT_STRATEGY_DEDUP_SECS", lookup("PIT_STRATEGY_DEDUP_SECS"))? {
        policy.dedup_resolution = v;
    }
    policy.validate()?;
    Ok(policy)
}

/// [`search_policy_from`] over the process environment.
pub fn search_policy_from_env() -> Result<SearchPolicy, PolicyError> {
    search_policy_from(|name| std::env::var(name).ok())
}
