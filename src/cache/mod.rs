//! Cache module for storing API responses
//!
//! This module provides a response cache that stores decoded JSON responses in
//! a key-value storage with a TTL. Expired entries are evicted lazily on read,
//! and storage failures degrade to cache misses instead of errors.

mod key;
mod manager;
mod storage;

pub use key::{build_key, QueryParams};
pub use manager::{Clock, ResponseCache, SystemClock, DEFAULT_NAMESPACE, DEFAULT_TTL};
pub use storage::{FileStorage, KvStorage, MemoryStorage, StorageError};
