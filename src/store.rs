//! Local persistence: a get/set-by-key byte store.
//!
//! The session keeps its whole state under two fixed keys, each holding
//! one serialized JSON document. The schema version is embedded in the key
//! name rather than the payload — bumping the version simply makes old
//! payloads invisible, so no migration logic exists anywhere.
//!
//! Implementations are intentionally dumb: [`MemoryStore`] for tests and
//! embedders with their own persistence, [`DirStore`] for the CLI. Write
//! atomicity in [`DirStore`] uses the temp-file-then-rename pattern so a
//! crash mid-write never leaves a truncated document behind.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::debug;

use crate::error::StoreError;

/// Store key for the current checklist document.
pub const CURRENT_KEY: &str = "barChecklist_v1";

/// Store key for the history list document.
pub const HISTORY_KEY: &str = "barChecklist_history_v1";

/// A key-value byte store the session persists into.
///
/// Errors are surfaced as [`StoreError`] so the caller decides tolerance;
/// the session logs and continues, treating in-memory state as the source
/// of truth (see `DESIGN.md`).
pub trait StateStore: Send + Sync {
    /// Read the payload under `key`; `Ok(None)` when absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write the payload under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Delete the payload under `key`; absent keys are not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ── In-memory store ──────────────────────────────────────────────────────

/// Volatile store backed by a map. State dies with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.map.lock().expect("store mutex").get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.map
            .lock()
            .expect("store mutex")
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.map.lock().expect("store mutex").remove(key);
        Ok(())
    }
}

// ── Directory store ──────────────────────────────────────────────────────

/// Filesystem store: one file per key under a data directory.
///
/// Writes go through a temporary file in the same directory followed by an
/// atomic rename, so readers never observe a partially written document.
#[derive(Debug)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Io {
            key: dir.display().to_string(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io {
                key: key.to_string(),
                source: e,
            }),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let io_err = |e: std::io::Error| StoreError::Io {
            key: key.to_string(),
            source: e,
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(value).map_err(io_err)?;
        tmp.persist(self.path_for(key))
            .map_err(|e| io_err(e.error))?;

        debug!("persisted {} bytes under key '{}'", value.len(), key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io {
                key: key.to_string(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.get(CURRENT_KEY).unwrap().is_none());

        store.put(CURRENT_KEY, b"{}").unwrap();
        assert_eq!(store.get(CURRENT_KEY).unwrap(), Some(b"{}".to_vec()));

        store.remove(CURRENT_KEY).unwrap();
        assert!(store.get(CURRENT_KEY).unwrap().is_none());
    }

    #[test]
    fn dir_store_round_trip_and_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        assert!(store.get(HISTORY_KEY).unwrap().is_none());
        store.put(HISTORY_KEY, b"[1]").unwrap();
        store.put(HISTORY_KEY, b"[1,2]").unwrap();
        assert_eq!(store.get(HISTORY_KEY).unwrap(), Some(b"[1,2]".to_vec()));

        store.remove(HISTORY_KEY).unwrap();
        store.remove(HISTORY_KEY).unwrap(); // second delete is a no-op
        assert!(store.get(HISTORY_KEY).unwrap().is_none());
    }

    #[test]
    fn dir_store_keys_map_to_separate_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        store.put(CURRENT_KEY, b"current").unwrap();
        store.put(HISTORY_KEY, b"history").unwrap();

        assert_eq!(store.get(CURRENT_KEY).unwrap(), Some(b"current".to_vec()));
        assert_eq!(store.get(HISTORY_KEY).unwrap(), Some(b"history".to_vec()));
    }
}
