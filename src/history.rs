//! Archive of strategies a user chose to keep.
//!
//! In memory behind a `Mutex`, optionally mirrored to a JSON file that is
//! rewritten after every change. The file is written after the entry lock is
//! released; each snapshot carries a generation number and an older snapshot
//! never overwrites a newer one. A failed write is logged and the in-memory
//! archive stays authoritative.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::{load_history, save_history, HistoryFile};
use crate::types::{SavedStrategy, Stint};

/// Fields supplied by the client when saving a strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewSavedStrategy {
    pub circuit: String,
    pub total_time: f64,
    pub pit_stops: u32,
    pub stints_description: String,
}

struct HistoryInner {
    entries: Vec<SavedStrategy>,
    next_id: u64,
    generation: u64,
}

struct HistorySink {
    path: PathBuf,
    /// Generation of the last snapshot on disk.
    written: Mutex<u64>,
}

type Snapshot = (u64, HistoryFile);

pub struct HistoryStore {
    inner: Mutex<HistoryInner>,
    sink: Option<HistorySink>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl HistoryStore {
    pub fn in_memory() -> Self {
        Self::from_archive(HistoryFile::default(), None)
    }

    /// Open a file-backed archive; a missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let archive = load_history(&path)?;
        tracing::info!(
            path = %path.display(),
            entries = archive.entries.len(),
            next_id = archive.next_id,
            "history loaded"
        );
        Ok(Self::from_archive(archive, Some(path)))
    }

    fn from_archive(archive: HistoryFile, path: Option<PathBuf>) -> Self {
        let highest = archive.entries.iter().map(|e| e.id).max().unwrap_or(0);
        let next_id = archive.next_id.max(highest + 1);
        Self {
            inner: Mutex::new(HistoryInner {
                entries: archive.entries,
                next_id,
                generation: 0,
            }),
            sink: path.map(|path| HistorySink {
                path,
                written: Mutex::new(0),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryInner> {
        lock_ignoring_poison(&self.inner)
    }

    /// Copy of the archive to write, taken under the entry lock. `None` for
    /// in-memory stores.
    fn snapshot(&self, inner: &mut HistoryInner) -> Option<Snapshot> {
        self.sink.as_ref()?;
        inner.generation += 1;
        Some((
            inner.generation,
            HistoryFile {
                next_id: inner.next_id,
                entries: inner.entries.clone(),
            },
        ))
    }

    /// Write a snapshot unless a newer one is already on disk. Must be called
    /// without holding the entry lock.
    fn persist(&self, snapshot: Option<Snapshot>) {
        let (Some(sink), Some((generation, archive))) = (&self.sink, snapshot) else {
            return;
        };
        let mut written = lock_ignoring_poison(&sink.written);
        if *written >= generation {
            return;
        }
        match save_history(&sink.path, &archive) {
            Ok(()) => *written = generation,
            Err(e) => tracing::warn!(error = %e, "failed to write history file"),
        }
    }

    /// Store a new record, assigning its id and creation timestamp.
    pub fn save(&self, new: NewSavedStrategy) -> SavedStrategy {
        let (saved, snapshot) = {
            let mut inner = self.lock();
            let saved = SavedStrategy {
                id: inner.next_id,
                circuit: new.circuit,
                total_time: new.total_time,
                pit_stops: new.pit_stops,
                stints_description: new.stints_description,
                created_at: chrono::Local::now().format("%d-%m-%Y %H:%M").to_string(),
            };
            inner.next_id += 1;
            inner.entries.push(saved.clone());
            (saved, self.snapshot(&mut inner))
        };
        self.persist(snapshot);
        saved
    }

    /// All records in insertion order.
    pub fn list(&self) -> Vec<SavedStrategy> {
        self.lock().entries.clone()
    }

    /// Remove record `id`. Returns false if it did not exist.
    pub fn delete(&self, id: u64) -> bool {
        let snapshot = {
            let mut inner = self.lock();
            let before = inner.entries.len();
            inner.entries.retain(|e| e.id != id);
            if inner.entries.len() == before {
                return false;
            }
            self.snapshot(&mut inner)
        };
        self.persist(snapshot);
        true
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One-line summary of a stint list, e.g. `SOFT 1-18 | HARD 19-50`.
pub fn describe_stints(stints: &[Stint]) -> String {
    stints
        .iter()
        .map(|s| format!("{} {}-{}", s.compound, s.start_lap, s.end_lap))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_entry(circuit: &str) -> NewSavedStrategy {
        NewSavedStrategy {
            circuit: circuit.to_string(),
            total_time: 5000.0,
            pit_stops: 1,
            stints_description: "SOFT 1-20 | HARD 21-50".to_string(),
        }
    }

    #[test]
    fn test_ids_increase() {
        let store = HistoryStore::in_memory();
        let a = store.save(new_entry("Bahrain Grand Prix"));
        let b = store.save(new_entry("Monaco Grand Prix"));
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.len(), 2);
        assert_eq!(a.created_at.len(), "18-10-2026 14:05".len());
    }

    #[test]
    fn test_delete() {
        let store = HistoryStore::in_memory();
        let a = store.save(new_entry("Bahrain Grand Prix"));
        store.save(new_entry("Monaco Grand Prix"));
        assert!(store.delete(a.id));
        assert!(!store.delete(a.id));
        let remaining = store.list();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].circuit, "Monaco Grand Prix");

        // Ids are never reused.
        assert_eq!(store.save(new_entry("Imola")).id, 3);
    }

    #[test]
    fn test_file_backed_store_reloads() {
        let path = std::env::temp_dir().join(format!(
            "pit-strategy-history-{}.json",
            std::process::id()
        ));
        {
            let store = HistoryStore::open(&path).unwrap();
            assert!(store.is_empty());
            store.save(new_entry("Bahrain Grand Prix"));
            store.save(new_entry("Monaco Grand Prix"));
        }
        let reopened = HistoryStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.save(new_entry("Imola")).id, 3);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_deleted_newest_id_stays_retired_after_reopen() {
        let path = std::env::temp_dir().join(format!(
            "pit-strategy-history-retired-{}.json",
            std::process::id()
        ));
        {
            let store = HistoryStore::open(&path).unwrap();
            store.save(new_entry("Bahrain Grand Prix"));
            let newest = store.save(new_entry("Monaco Grand Prix"));
            assert!(store.delete(newest.id));
        }
        let reopened = HistoryStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.save(new_entry("Imola")).id, 3);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_stale_snapshot_does_not_overwrite_newer_file() {
        let path = std::env::temp_dir().join(format!(
            "pit-strategy-history-stale-{}.json",
            std::process::id()
        ));
        let store = HistoryStore::open(&path).unwrap();
        store.save(new_entry("Bahrain Grand Prix"));
        let stale = {
            let mut inner = store.lock();
            store.snapshot(&mut inner)
        };
        store.save(new_entry("Monaco Grand Prix"));

        // A writer that lost the race to the newer save.
        store.persist(stale);
        let on_disk = load_history(&path).unwrap();
        assert_eq!(on_disk.entries.len(), 2);
        assert_eq!(on_disk.next_id, 3);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_describe_stints() {
        let stints = vec![Stint::new("SOFT", 1, 18), Stint::new("HARD", 19, 50)];
        assert_eq!(describe_stints(&stints), "SOFT 1-18 | HARD 19-50");
        assert_eq!(describe_stints(&[]), "");
    }
}
