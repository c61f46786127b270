//! Cache Module
//!
//! In-memory document cache with TTL expiration and LRU eviction.

mod entry;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

pub use entry::{current_timestamp_ms, CacheEntry};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;

use std::sync::Arc;

use tokio::sync::RwLock;

/// Cache handle shared between the cached store, handlers, and the cleanup task.
pub type SharedCache = Arc<RwLock<CacheStore>>;

/// Wraps a cache for sharing.
pub fn shared(cache: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(cache))
}
