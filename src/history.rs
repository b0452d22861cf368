use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::HistoryEntry;

pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read history from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write history to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize history: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}

/// A single persisted slot holding the serialized history.
pub trait HistoryBackend: Send {
    fn read(&self) -> Result<Option<String>, StorageError>;
    fn write(&mut self, contents: &str) -> Result<(), StorageError>;
}

#[derive(Clone, Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryBackend for FileBackend {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                path: self.path.display().to_string(),
                source: e,
            }),
        }
    }

    fn write(&mut self, contents: &str) -> Result<(), StorageError> {
        let to_err = |e| StorageError::Write {
            path: self.path.display().to_string(),
            source: e,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(to_err)?;
        }
        std::fs::write(&self.path, contents).map_err(to_err)
    }
}

// In-process slot for embedders without a filesystem.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    slot: Option<String>,
}

impl MemoryBackend {
    pub fn new(contents: Option<&str>) -> Self {
        Self {
            slot: contents.map(str::to_string),
        }
    }
}

impl HistoryBackend for MemoryBackend {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot.clone())
    }

    fn write(&mut self, contents: &str) -> Result<(), StorageError> {
        self.slot = Some(contents.to_string());
        Ok(())
    }
}

/// Recently viewed clients, most recent first, unique by id. Persistence is
/// best effort: failures are logged and never reach the caller.
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    backend: Box<dyn HistoryBackend>,
}

impl HistoryStore {
    pub fn load(backend: Box<dyn HistoryBackend>) -> Self {
        let entries = match backend.read() {
            Ok(Some(raw)) => parse_entries(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "history unavailable, starting empty");
                Vec::new()
            }
        };
        debug!(entries = entries.len(), "history loaded");
        Self { entries, backend }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.retain(|e| e.id != entry.id);
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAPACITY);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.entries)
            .map_err(|e| StorageError::Serialize { source: e })
            .and_then(|raw| self.backend.write(&raw));
        if let Err(e) = result {
            warn!(error = %e, "failed to persist history");
        }
    }
}

// Corrupt data reads as empty; a valid array is deduplicated and bounded.
fn parse_entries(raw: &str) -> Vec<HistoryEntry> {
    let values = match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(values) => values,
        Err(e) => {
            warn!(error = %e, "history is corrupt, starting empty");
            return Vec::new();
        }
    };
    let mut out: Vec<HistoryEntry> = Vec::new();
    for value in values {
        let Ok(entry) = serde_json::from_value::<HistoryEntry>(value) else {
            continue;
        };
        if out.iter().any(|e| e.id == entry.id) {
            continue;
        }
        out.push(entry);
        if out.len() == HISTORY_CAPACITY {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            name: None,
            age: None,
            region: None,
            income: None,
        }
    }

    fn ids(store: &HistoryStore) -> Vec<&str> {
        store.entries().iter().map(|e| e.id.as_str()).collect()
    }

    struct FailingBackend;

    impl HistoryBackend for FailingBackend {
        fn read(&self) -> Result<Option<String>, StorageError> {
            Err(StorageError::Read {
                path: "slot".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }

        fn write(&mut self, _: &str) -> Result<(), StorageError> {
            Err(StorageError::Write {
                path: "slot".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "quota"),
            })
        }
    }

    #[test]
    fn record_moves_existing_id_to_front() {
        let mut store = HistoryStore::load(Box::new(MemoryBackend::default()));
        store.record(entry("1"));
        store.record(entry("2"));
        store.record(entry("3"));
        store.record(entry("1"));
        assert_eq!(ids(&store), vec!["1", "3", "2"]);
    }

    #[test]
    fn record_is_bounded() {
        let mut store = HistoryStore::load(Box::new(MemoryBackend::default()));
        for i in 0..25 {
            store.record(entry(&i.to_string()));
        }
        assert_eq!(store.len(), HISTORY_CAPACITY);
        assert_eq!(store.get(0).unwrap().id, "24");
        assert_eq!(store.get(9).unwrap().id, "15");
    }

    #[test]
    fn corrupt_or_absent_slot_loads_empty() {
        let store = HistoryStore::load(Box::new(MemoryBackend::new(Some("{not json"))));
        assert!(store.is_empty());
        let store = HistoryStore::load(Box::new(MemoryBackend::new(Some(r#"{"id":"1"}"#))));
        assert!(store.is_empty());
        let store = HistoryStore::load(Box::new(MemoryBackend::new(None)));
        assert!(store.is_empty());
    }

    #[test]
    fn load_skips_bad_items_and_duplicates() {
        let raw = r#"[{"id":"1"},{"nope":true},{"id":"1","age":3},{"id":"2","income":100.0}]"#;
        let store = HistoryStore::load(Box::new(MemoryBackend::new(Some(raw))));
        assert_eq!(ids(&store), vec!["1", "2"]);
        assert_eq!(store.get(1).unwrap().income, Some(100.0));
    }

    #[test]
    fn fractional_age_survives_reload() {
        let raw = r#"[{"id":"5","age":30.5},{"id":"6","age":41}]"#;
        let store = HistoryStore::load(Box::new(MemoryBackend::new(Some(raw))));
        assert_eq!(ids(&store), vec!["5", "6"]);
        assert_eq!(store.get(0).unwrap().age, Some(30.5));
        assert_eq!(store.get(1).unwrap().age, Some(41.0));
    }

    #[test]
    fn storage_failures_are_swallowed() {
        let mut store = HistoryStore::load(Box::new(FailingBackend));
        store.record(entry("1"));
        store.clear();
        store.record(entry("2"));
        assert_eq!(ids(&store), vec!["2"]);
    }

    #[test]
    fn file_backend_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");
        {
            let mut store = HistoryStore::load(Box::new(FileBackend::new(&path)));
            store.record(entry("0000007"));
            store.record(entry("42"));
        }
        let store = HistoryStore::load(Box::new(FileBackend::new(&path)));
        assert_eq!(ids(&store), vec!["42", "0000007"]);
    }

    #[test]
    fn clear_persists_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut store = HistoryStore::load(Box::new(FileBackend::new(&path)));
        store.record(entry("1"));
        store.clear();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
