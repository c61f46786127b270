//! Cache Store Module
//!
//! Document cache combining HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;

use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::error::{AppError, Result};
use crate::store::{Document, MAX_PATH_LENGTH};

// == Cache Store ==
/// Documents keyed by their full path.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    stats: CacheStats,
    /// Maximum number of cached documents
    max_entries: usize,
    /// TTL in seconds for entries cached without an explicit TTL
    default_ttl: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a cache holding at most `max_entries` documents for `default_ttl` seconds.
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
        }
    }

    // == Set ==
    /// Caches a document under `key`.
    ///
    /// Overwriting resets the TTL. Inserting a new key at capacity evicts
    /// the least recently used entry.
    pub fn set(&mut self, key: &str, document: Document, ttl: Option<u64>) -> Result<()> {
        if key.is_empty() || key.len() > MAX_PATH_LENGTH {
            return Err(AppError::InvalidRequest(format!(
                "Cache key must be 1 to {} bytes",
                MAX_PATH_LENGTH
            )));
        }

        let is_overwrite = self.entries.contains_key(key);
        if !is_overwrite && self.entries.len() >= self.max_entries {
            match self.lru.evict_oldest() {
                Some(evicted) => {
                    self.entries.remove(&evicted);
                    self.stats.record_eviction();
                }
                None => {
                    return Err(AppError::CacheFull(
                        "Cache is full and eviction failed".to_string(),
                    ))
                }
            }
        }

        let entry = CacheEntry::new(document, Some(ttl.unwrap_or(self.default_ttl)));
        self.entries.insert(key.to_string(), entry);
        self.lru.touch(key);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Get ==
    /// Returns the cached document if present and not expired.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Result<Document> {
        let Some(entry) = self.entries.get(key) else {
            self.stats.record_miss();
            return Err(AppError::NotFound(key.to_string()));
        };

        if entry.is_expired() {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            return Err(AppError::Expired(key.to_string()));
        }

        let document = entry.document.clone();
        self.stats.record_hit();
        self.lru.touch(key);
        Ok(document)
    }

    // == Invalidate ==
    /// Drops a cached document. Returns whether it was cached.
    pub fn invalidate(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            self.stats.record_invalidation();
            self.stats.set_total_entries(self.entries.len());
            true
        } else {
            false
        }
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_expirations(expired_keys.len());
        self.stats.set_total_entries(self.entries.len());
        expired_keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
