//! Error types for the layers around the engine.
//!
//! The search itself never fails: degenerate inputs produce fewer or no
//! strategies. Errors only arise from configuration, file I/O and request
//! validation.

use thiserror::Error;

/// Invalid [`crate::types::SearchPolicy`] value.
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("{field} must be at least 1")]
    ZeroValue { field: &'static str },
    #[error("dedup resolution must be a positive number of seconds (got {value})")]
    InvalidResolution { value: f64 },
    #[error("cannot parse {var}={value}")]
    Unparsable { var: &'static str, value: String },
}

/// Failure reading or writing a data file.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Rejected strategy request.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("total_laps must be between 1 and {max} (got {value})")]
    LapsOutOfRange { value: i64, max: u32 },
    #[error("at least one tyre prediction is required")]
    NoTyres,
    #[error("at most {max} compounds are supported (got {value})")]
    TooManyCompounds { value: usize, max: usize },
    #[error("compound name must not be empty")]
    EmptyCompound,
    #[error("compound {0} appears more than once")]
    DuplicateCompound(String),
    #[error("base_time for {compound} must be positive (got {value})")]
    InvalidBaseTime { compound: String, value: f64 },
    #[error("degradation_rate for {compound} must be non-negative (got {value})")]
    InvalidDegradation { compound: String, value: f64 },
    #[error("no tyre predictions available for {0}")]
    UnknownCircuit(String),
    #[error("history entry {0} not found")]
    HistoryNotFound(u64),
    #[error("strategy search did not finish within its time budget")]
    SearchTimedOut,
}
