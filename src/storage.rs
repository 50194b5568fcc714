//! JSON file I/O for prediction tables and the strategy history archive.
//!
//! Prediction files are either a table (array of
//! [`PredictionRow`]) or a bare array of [`TyrePrediction`]. History files
//! hold a [`HistoryFile`] and are rewritten atomically (write to `.tmp`,
//! then rename).

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::predictions::{PredictionRow, PredictionTable};
use crate::types::{SavedStrategy, TyrePrediction};

pub const PREDICTIONS_FILE_PATH: &str = "data/predictions.json";
pub const HISTORY_FILE_PATH: &str = "data/history.json";

/// Contents of a predictions file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PredictionFile {
    Table(Vec<PredictionRow>),
    Tyres(Vec<TyrePrediction>),
}

/// On-disk history archive. `next_id` is the high-water mark for ids, so an
/// id stays retired after its record is deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryFile {
    pub next_id: u64,
    pub entries: Vec<SavedStrategy>,
}

impl Default for HistoryFile {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }
}

fn read_file(path: &Path) -> Result<String, StorageError> {
    fs::read_to_string(path).map_err(|source| StorageError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_json<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T, StorageError> {
    serde_json::from_str(content).map_err(|source| StorageError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Load either file shape.
pub fn load_prediction_file(path: impl AsRef<Path>) -> Result<PredictionFile, StorageError> {
    let path = path.as_ref();
    let content = read_file(path)?;
    parse_json(path, &content)
}

/// Load a prediction table (array of rows).
pub fn load_prediction_table(path: impl AsRef<Path>) -> Result<PredictionTable, StorageError> {
    let path = path.as_ref();
    let content = read_file(path)?;
    let rows: Vec<PredictionRow> = parse_json(path, &content)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "prediction table loaded");
    Ok(PredictionTable::new(rows))
}

/// Load the history archive. A missing file is an empty archive.
pub fn load_history(path: impl AsRef<Path>) -> Result<HistoryFile, StorageError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(HistoryFile::default());
    }
    let content = read_file(path)?;
    parse_json(path, &content)
}

/// Rewrite the history archive, creating parent directories as needed.
pub fn save_history(path: impl AsRef<Path>, archive: &HistoryFile) -> Result<(), StorageError> {
    let path = path.as_ref();
    let io_err = |source: std::io::Error| StorageError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(archive).map_err(|source| StorageError::Json {
        path: path.display().to_string(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}
