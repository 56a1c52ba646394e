//! Presence cache trait and backends.
//!
//! The cache holds the last successfully observed snapshot per tracked
//! account, durable across restarts. A live fetch success always
//! overwrites the entry; a live fetch failure only reads it (the fetcher
//! marks the reused value stale). Entries never expire — staleness is
//! signaled per-use, not by age-based eviction.

use crate::models::{PresenceSnapshot, PresenceStatus};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Trait for presence cache backends.
pub trait PresenceCache: Send + Sync {
    /// Returns the cached snapshot for a tracked account, if any.
    fn get(&self, entity_id: u64) -> Result<Option<PresenceSnapshot>>;

    /// Stores a snapshot, overwriting any prior entry for the account.
    fn put(&self, entity_id: u64, snapshot: &PresenceSnapshot) -> Result<()>;
}

/// Serializable snapshot format for file storage.
///
/// The stale flag is intentionally absent: only live observations are
/// written, and staleness is applied per-use when a cached value is read
/// back after a failed fetch.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSnapshot {
    status: PresenceStatus,
    place_id: Option<u64>,
    observed_at: DateTime<Utc>,
}

impl From<&PresenceSnapshot> for StoredSnapshot {
    fn from(s: &PresenceSnapshot) -> Self {
        Self {
            status: s.status,
            place_id: s.place_id,
            observed_at: s.observed_at,
        }
    }
}

impl StoredSnapshot {
    fn into_snapshot(self) -> PresenceSnapshot {
        PresenceSnapshot {
            status: self.status,
            place_id: self.place_id,
            observed_at: self.observed_at,
            stale: false,
        }
    }
}

/// JSON-file presence cache.
///
/// One JSON object keyed by stringified account id, rewritten whole on
/// every put. Reads and writes from the poll driver and on-demand status
/// checks are serialized by an internal mutex; last-write-wins per key.
pub struct JsonFileCache {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileCache {
    /// Creates a cache backed by the given file, creating an empty file
    /// if none exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cache`] if the file cannot be created.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            std::fs::write(&path, "{}").map_err(|e| Error::Cache {
                operation: "create_cache_file".to_string(),
                cause: e.to_string(),
            })?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    fn read_entries(&self) -> Result<HashMap<String, StoredSnapshot>> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| Error::Cache {
            operation: "read_cache_file".to_string(),
            cause: e.to_string(),
        })?;

        serde_json::from_str(&contents).map_err(|e| Error::Cache {
            operation: "parse_cache_file".to_string(),
            cause: e.to_string(),
        })
    }

    fn write_entries(&self, entries: &HashMap<String, StoredSnapshot>) -> Result<()> {
        let contents = serde_json::to_string(entries).map_err(|e| Error::Cache {
            operation: "serialize_cache".to_string(),
            cause: e.to_string(),
        })?;

        std::fs::write(&self.path, contents).map_err(|e| Error::Cache {
            operation: "write_cache_file".to_string(),
            cause: e.to_string(),
        })
    }
}

impl PresenceCache for JsonFileCache {
    fn get(&self, entity_id: u64) -> Result<Option<PresenceSnapshot>> {
        let _guard = super::registry::acquire_lock(&self.lock);
        let mut entries = self.read_entries()?;
        Ok(entries
            .remove(&entity_id.to_string())
            .map(StoredSnapshot::into_snapshot))
    }

    fn put(&self, entity_id: u64, snapshot: &PresenceSnapshot) -> Result<()> {
        let _guard = super::registry::acquire_lock(&self.lock);
        // A fresh live snapshot is in hand, so an unreadable file is
        // rebuilt from scratch instead of wedging every future write.
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "cache file unreadable, rewriting from scratch");
                HashMap::new()
            },
        };
        entries.insert(entity_id.to_string(), StoredSnapshot::from(snapshot));
        self.write_entries(&entries)
    }
}

/// In-memory presence cache (useful for testing and one-shot commands).
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<u64, PresenceSnapshot>>,
}

impl MemoryCache {
    /// Creates an empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresenceCache for MemoryCache {
    fn get(&self, entity_id: u64) -> Result<Option<PresenceSnapshot>> {
        let entries = super::registry::acquire_lock(&self.entries);
        Ok(entries.get(&entity_id).cloned())
    }

    fn put(&self, entity_id: u64, snapshot: &PresenceSnapshot) -> Result<()> {
        let mut entries = super::registry::acquire_lock(&self.entries);
        entries.insert(entity_id, snapshot.clone());
        Ok(())
    }
}
