//! Response cache with lazy TTL expiry
//!
//! Provides a `ResponseCache` that stores decoded API responses in a
//! key-value storage, stamped with the time they were written. Entries older
//! than the TTL are evicted when they are read; there is no background sweep.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::storage::{KvStorage, StorageError};

/// Namespace prepended to every key this cache writes
pub const DEFAULT_NAMESPACE: &str = "moviex_cache_v1:";

/// Default time-to-live for cached responses (one hour)
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Persisted form of a cache entry
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// When the entry was written, in epoch milliseconds
    ts: i64,
    /// The decoded response body
    value: Value,
}

/// Source of the current time in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Caches JSON responses by request key
///
/// Storage failures never escape: a failed read is a miss and a failed write
/// leaves the cache unchanged. Caching is an optimization only.
pub struct ResponseCache {
    storage: Box<dyn KvStorage>,
    namespace: String,
    ttl: Duration,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("namespace", &self.namespace)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl ResponseCache {
    /// Creates a cache over `storage` with the given TTL
    pub fn new(storage: impl KvStorage + 'static, ttl: Duration) -> Self {
        Self {
            storage: Box::new(storage),
            namespace: DEFAULT_NAMESPACE.to_string(),
            ttl,
            clock: Box::new(SystemClock),
        }
    }

    /// Replaces the clock used to stamp and age entries
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replaces the key namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Returns the configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Returns the cached value for `key` if it is no older than the TTL
    ///
    /// A stale entry is removed as a side effect. An entry stamped later than
    /// the current time (the clock went backwards) is stale too.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.try_get(key) {
            Ok(value) => value,
            Err(e) => {
                debug!(key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Stores `value` under `key`, stamped with the current time
    pub fn set(&self, key: &str, value: &Value) {
        if let Err(e) = self.try_set(key, value) {
            debug!(key, error = %e, "cache write failed, skipping");
        }
    }

    /// Removes every entry in this cache's namespace
    pub fn clear(&self) {
        if let Err(e) = self.try_clear() {
            debug!(error = %e, "cache clear failed");
        }
    }

    /// Number of entries in this cache's namespace, fresh or stale
    pub fn len(&self) -> usize {
        self.owned_keys().map(|keys| keys.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn try_get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let storage_key = self.storage_key(key);
        let Some(raw) = self.storage.get_item(&storage_key)? else {
            return Ok(None);
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key, error = %e, "unreadable cache entry");
                return Ok(None);
            }
        };

        let age_millis = self.clock.now_millis() - entry.ts;
        if age_millis < 0 || age_millis > self.ttl_millis() {
            debug!(key, age_millis, "evicting expired cache entry");
            self.storage.remove_item(&storage_key)?;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    fn try_set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let entry = CacheEntry {
            ts: self.clock.now_millis(),
            value: value.clone(),
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        self.storage.set_item(&self.storage_key(key), &json)
    }

    fn try_clear(&self) -> Result<(), StorageError> {
        for key in self.owned_keys()? {
            self.storage.remove_item(&key)?;
        }
        Ok(())
    }

    fn owned_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .storage
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(&self.namespace))
            .collect())
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }
}
