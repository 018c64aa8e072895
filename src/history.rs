//! Persisted search history

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum number of remembered queries.
pub const HISTORY_CAP: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HistoryEntry {
    pub query: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("history io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("history file corrupted: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("history lock poisoned")]
    Poisoned,
}

/// Read-modify-write access to past queries, most recent first.
///
/// Implementations never fail outward: storage problems degrade to an empty
/// history and no-op writes.
pub trait HistoryStore: Send + Sync {
    fn get_all(&self) -> Vec<HistoryEntry>;
    fn add(&self, query: &str);
}

/// Drop any entry matching `query` case-insensitively, prepend a fresh one
/// and cap the list.
pub fn record(entries: &mut Vec<HistoryEntry>, query: &str, timestamp: DateTime<Utc>) {
    let lowered = query.to_lowercase();
    entries.retain(|entry| entry.query.to_lowercase() != lowered);
    entries.insert(
        0,
        HistoryEntry {
            query: query.to_string(),
            timestamp,
        },
    );
    entries.truncate(HISTORY_CAP);
}

/// JSON file store, one array of entries.
pub struct JsonHistoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn default_path() -> PathBuf {
        let base = dirs_next::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("pokesearch").join("history.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&json)?)
    }

    fn write(&self, entries: &[HistoryEntry]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn try_add(&self, query: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.read()?;
        record(&mut entries, query, Utc::now());
        self.write(&entries)
    }
}

impl HistoryStore for JsonHistoryStore {
    fn get_all(&self) -> Vec<HistoryEntry> {
        let result = self
            .lock
            .lock()
            .map_err(|_| StorageError::Poisoned)
            .and_then(|_guard| self.read());
        match result {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(path = %self.path.display(), "history unavailable: {err}");
                Vec::new()
            }
        }
    }

    fn add(&self, query: &str) {
        if let Err(err) = self.try_add(query) {
            tracing::debug!(path = %self.path.display(), "history write skipped: {err}");
        }
    }
}

/// In-memory store, used with `--no-history` and in tests.
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<HistoryEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn get_all(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    fn add(&self, query: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            record(&mut entries, query, Utc::now());
        }
    }
}
