//! Result caching.
//!
//! This module provides:
//! - The `TtlStore` abstraction with in-memory and file-backed backends
//! - `ResultCache`, a two-tier TTL cache over serde-serializable results: an
//!   in-process map consulted first, then the durable store
//! - Deterministic cache-key derivation from normalized inputs
//!
//! A cache hit short-circuits all provider calls, rate limiting, and
//! circuit-breaker bookkeeping for that request.

mod store;

pub use store::{FileTtlStore, MemoryTtlStore, TtlStore};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Derives a cache key from input parts: case-insensitive, trimmed, and
/// field-order-stable. Empty parts are kept so "street||city" stays distinct
/// from "street|city|".
pub fn cache_key(namespace: &str, parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("|");
    format!("{}:{}", namespace, joined)
}

/// Two-tier TTL cache for one result namespace.
///
/// The in-process tier avoids store reads for repeated lookups within this
/// process; the durable tier survives restarts when backed by `FileTtlStore`.
/// Both tiers honor the same TTL.
pub struct ResultCache {
    namespace: String,
    ttl: Duration,
    memory: Mutex<HashMap<String, (String, Instant)>>,
    store: Arc<dyn TtlStore>,
}

impl ResultCache {
    /// Creates a cache writing `namespace:`-prefixed keys into `store`.
    pub fn new(namespace: &str, ttl: Duration, store: Arc<dyn TtlStore>) -> Self {
        ResultCache {
            namespace: namespace.to_string(),
            ttl,
            memory: Mutex::new(HashMap::new()),
            store,
        }
    }

    /// Derives this cache's key for the given input parts.
    pub fn key(&self, parts: &[&str]) -> String {
        cache_key(&self.namespace, parts)
    }

    /// Looks up a previously stored result.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        {
            let mut memory = self.memory.lock().expect("cache mutex poisoned");
            if let Some((raw, stored_at)) = memory.get(key).cloned() {
                if stored_at.elapsed() < self.ttl {
                    match serde_json::from_str(&raw) {
                        Ok(value) => return Some(value),
                        Err(_) => {
                            memory.remove(key);
                        }
                    }
                } else {
                    memory.remove(key);
                }
            }
        }

        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => {
                // Backfill the in-process tier for subsequent lookups
                self.memory
                    .lock()
                    .expect("cache mutex poisoned")
                    .insert(key.to_string(), (raw, Instant::now()));
                Some(value)
            }
            Err(e) => {
                log::warn!("Discarding undecodable cache entry {}: {}", key, e);
                self.store.delete(key);
                None
            }
        }
    }

    /// Stores a result in both tiers.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };
        self.memory
            .lock()
            .expect("cache mutex poisoned")
            .insert(key.to_string(), (raw.clone(), Instant::now()));
        self.store.set(key, &raw, Some(self.ttl));
    }
}
