//! Durable TTL key-value store backends.
//!
//! The core only depends on the small `TtlStore` interface; deployments pick
//! the in-memory backend (single process, state dies with it) or the
//! file-backed one (JSON document with per-entry timestamps, surviving
//! restarts). The file backend rewrites the whole document on every set,
//! which is acceptable at this write rate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::error_handling::InitializationError;

/// Durable TTL key-value store.
///
/// `ttl = None` means the entry never expires (used for the territory
/// collection). Values are opaque strings; callers serialize with serde.
pub trait TtlStore: Send + Sync {
    /// Fetches a live entry, or `None` if absent or expired.
    fn get(&self, key: &str) -> Option<String>;
    /// Inserts or overwrites an entry.
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>);
    /// Removes an entry if present.
    fn delete(&self, key: &str);
}

/// In-memory store. Entries expire lazily on read.
#[derive(Default)]
pub struct MemoryTtlStore {
    entries: Mutex<HashMap<String, (String, Option<SystemTime>)>>,
}

impl MemoryTtlStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TtlStore for MemoryTtlStore {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        let (value, expires_at) = entries.get(key)?.clone();
        if let Some(expires_at) = expires_at {
            if SystemTime::now() >= expires_at {
                entries.remove(key);
                return None;
            }
        }
        Some(value)
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| SystemTime::now() + ttl);
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), (value.to_string(), expires_at));
    }

    fn delete(&self, key: &str) {
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .remove(key);
    }
}

/// One persisted entry with its write timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileEntry {
    value: String,
    cached_at: SystemTime,
    ttl_secs: Option<u64>,
}

impl FileEntry {
    fn is_expired(&self) -> bool {
        match self.ttl_secs {
            Some(ttl) => self.cached_at.elapsed().unwrap_or_default().as_secs() > ttl,
            None => false,
        }
    }
}

/// File-backed store: a single JSON document under the cache directory.
pub struct FileTtlStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process; concurrent
    // processes race with last-writer-wins, same as the in-memory tier
    lock: Mutex<()>,
}

impl FileTtlStore {
    /// Opens (and creates if needed) the store under `dir`.
    pub fn open(dir: &Path) -> Result<Self, InitializationError> {
        std::fs::create_dir_all(dir).map_err(|e| {
            InitializationError::StoreError(format!(
                "failed to create cache directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(FileTtlStore {
            path: dir.join("address_status_store.json"),
            lock: Mutex::new(()),
        })
    }

    fn load(&self) -> HashMap<String, FileEntry> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return HashMap::new(),
        };
        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!(
                    "Discarding unreadable store file {}: {}",
                    self.path.display(),
                    e
                );
                HashMap::new()
            }
        }
    }

    fn persist(&self, entries: &HashMap<String, FileEntry>) {
        match serde_json::to_string(entries) {
            Ok(content) => {
                if let Err(e) = std::fs::write(&self.path, content) {
                    log::error!("Failed to write store file {}: {}", self.path.display(), e);
                }
            }
            Err(e) => log::error!("Failed to serialize store entries: {}", e),
        }
    }
}

impl TtlStore for FileTtlStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().expect("store mutex poisoned");
        let entries = self.load();
        let entry = entries.get(key)?;
        if entry.is_expired() {
            return None;
        }
        Some(entry.value.clone())
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let _guard = self.lock.lock().expect("store mutex poisoned");
        let mut entries = self.load();
        entries.retain(|_, entry| !entry.is_expired());
        entries.insert(
            key.to_string(),
            FileEntry {
                value: value.to_string(),
                cached_at: SystemTime::now(),
                ttl_secs: ttl.map(|d| d.as_secs()),
            },
        );
        self.persist(&entries);
    }

    fn delete(&self, key: &str) {
        let _guard = self.lock.lock().expect("store mutex poisoned");
        let mut entries = self.load();
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryTtlStore::new();
        assert_eq!(store.get("k"), None);

        store.set("k", "v", Some(Duration::from_secs(60)));
        assert_eq!(store.get("k"), Some("v".to_string()));

        store.delete("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_memory_store_expires() {
        let store = MemoryTtlStore::new();
        store.set("k", "v", Some(Duration::from_millis(10)));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_memory_store_no_ttl_never_expires() {
        let store = MemoryTtlStore::new();
        store.set("territories", "[]", None);
        assert_eq!(store.get("territories"), Some("[]".to_string()));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTtlStore::open(dir.path()).expect("open store");

        store.set("k", "v", Some(Duration::from_secs(60)));
        assert_eq!(store.get("k"), Some("v".to_string()));

        store.delete("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let store = FileTtlStore::open(dir.path()).expect("open store");
            store.set("k", "persisted", Some(Duration::from_secs(60)));
        }
        let store = FileTtlStore::open(dir.path()).expect("reopen store");
        assert_eq!(store.get("k"), Some("persisted".to_string()));
    }

    #[test]
    fn test_file_store_expired_entry_is_dropped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTtlStore::open(dir.path()).expect("open store");

        store.set("short", "v", Some(Duration::from_secs(0)));
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(store.get("short"), None);
    }

    #[test]
    fn test_file_store_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTtlStore::open(dir.path()).expect("open store");
        std::fs::write(dir.path().join("address_status_store.json"), "not json").expect("write");

        assert_eq!(store.get("k"), None);
        store.set("k", "v", None);
        assert_eq!(store.get("k"), Some("v".to_string()));
    }
}
