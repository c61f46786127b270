//! Read-through cache in front of a document store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Document, DocumentPath, DocumentStore, Fields};
use crate::cache::SharedCache;
use crate::error::Result;

/// Serves reads from the cache and keeps it consistent with writes made
/// through this store.
///
/// Every write or delete bumps `writes` while holding the cache lock. A read
/// that missed only fills the cache if no write landed since the miss, so a
/// slow read cannot replace a newer cached copy.
pub struct CachedStore {
    inner: Arc<dyn DocumentStore>,
    cache: SharedCache,
    writes: AtomicU64,
}

impl CachedStore {
    pub fn new(inner: Arc<dyn DocumentStore>, cache: SharedCache) -> Self {
        Self {
            inner,
            cache,
            writes: AtomicU64::new(0),
        }
    }

    /// The shared cache, for statistics and cleanup.
    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }
}

#[async_trait]
impl DocumentStore for CachedStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        let key = path.to_string();
        // write lock: a hit updates LRU order and stats
        if let Ok(document) = self.cache.write().await.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(Some(document));
        }

        let writes_at_miss = self.writes.load(Ordering::SeqCst);
        let fetched = self.inner.get(path).await?;
        if let Some(document) = &fetched {
            let mut cache = self.cache.write().await;
            if self.writes.load(Ordering::SeqCst) == writes_at_miss {
                cache.set(&key, document.clone(), None)?;
            } else {
                debug!("Skipping cache fill for {}: written during read", key);
            }
        }
        Ok(fetched)
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<Document> {
        let key = path.to_string();
        match self.inner.set(path, fields).await {
            Ok(document) => {
                let mut cache = self.cache.write().await;
                self.writes.fetch_add(1, Ordering::SeqCst);
                cache.set(&key, document.clone(), None)?;
                Ok(document)
            }
            Err(err) => {
                // The write may have landed; do not keep serving the old copy.
                let mut cache = self.cache.write().await;
                self.writes.fetch_add(1, Ordering::SeqCst);
                cache.invalidate(&key);
                Err(err)
            }
        }
    }

    async fn delete(&self, path: &DocumentPath) -> Result<()> {
        let result = self.inner.delete(path).await;
        let mut cache = self.cache.write().await;
        self.writes.fetch_add(1, Ordering::SeqCst);
        cache.invalidate(&path.to_string());
        result
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        self.inner.list(collection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{shared, CacheStore};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::time::Duration;

    /// Reads from the backing store, then stalls before returning.
    struct SlowReads {
        inner: Arc<MemoryStore>,
        delay: Duration,
    }

    #[async_trait]
    impl DocumentStore for SlowReads {
        async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
            let snapshot = self.inner.get(path).await?;
            tokio::time::sleep(self.delay).await;
            Ok(snapshot)
        }

        async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<Document> {
            self.inner.set(path, fields).await
        }

        async fn delete(&self, path: &DocumentPath) -> Result<()> {
            self.inner.delete(path).await
        }

        async fn list(&self, collection: &str) -> Result<Vec<Document>> {
            self.inner.list(collection).await
        }
    }

    fn setup() -> (Arc<MemoryStore>, CachedStore) {
        let backing = Arc::new(MemoryStore::new());
        let cached = CachedStore::new(backing.clone(), shared(CacheStore::new(10, 300)));
        (backing, cached)
    }

    fn fields(level: i64) -> Fields {
        let mut fields = Fields::new();
        fields.insert("level".into(), json!(level));
        fields
    }

    #[tokio::test]
    async fn test_read_through_populates_cache() {
        let (backing, cached) = setup();
        let path = DocumentPath::parse("users/u1").unwrap();
        backing.set(&path, fields(1)).await.unwrap();

        assert!(cached.get(&path).await.unwrap().is_some());
        assert!(cached.get(&path).await.unwrap().is_some());

        let stats = cached.cache().read().await.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test]
    async fn test_missing_documents_not_cached() {
        let (_, cached) = setup();
        let path = DocumentPath::parse("users/ghost").unwrap();

        assert!(cached.get(&path).await.unwrap().is_none());
        assert!(cached.cache().read().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_through_replaces_cached_copy() {
        let (_, cached) = setup();
        let path = DocumentPath::parse("users/u1").unwrap();

        cached.set(&path, fields(1)).await.unwrap();
        cached.get(&path).await.unwrap();
        cached.set(&path, fields(2)).await.unwrap();

        let doc = cached.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.fields["level"], json!(2));
    }

    #[tokio::test]
    async fn test_delete_invalidates() {
        let (backing, cached) = setup();
        let path = DocumentPath::parse("users/u1").unwrap();

        cached.set(&path, fields(1)).await.unwrap();
        cached.delete(&path).await.unwrap();

        assert!(cached.get(&path).await.unwrap().is_none());
        assert!(backing.get(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_slow_read_does_not_overwrite_newer_write() {
        let backing = Arc::new(MemoryStore::new());
        let slow = Arc::new(SlowReads {
            inner: backing.clone(),
            delay: Duration::from_millis(100),
        });
        let cached = CachedStore::new(slow, shared(CacheStore::new(10, 300)));
        let path = DocumentPath::parse("users/u1").unwrap();
        backing.set(&path, fields(1)).await.unwrap();

        let (read, written) = tokio::join!(cached.get(&path), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cached.set(&path, fields(2)).await
        });
        assert_eq!(read.unwrap().unwrap().fields["level"], json!(1));
        written.unwrap();

        let doc = cached.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.fields["level"], json!(2));
    }

    #[tokio::test]
    async fn test_slow_read_does_not_resurrect_deleted_document() {
        let backing = Arc::new(MemoryStore::new());
        let slow = Arc::new(SlowReads {
            inner: backing.clone(),
            delay: Duration::from_millis(100),
        });
        let cached = CachedStore::new(slow, shared(CacheStore::new(10, 300)));
        let path = DocumentPath::parse("users/u1").unwrap();
        backing.set(&path, fields(1)).await.unwrap();

        let (read, deleted) = tokio::join!(cached.get(&path), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cached.delete(&path).await
        });
        assert!(read.unwrap().is_some());
        deleted.unwrap();

        assert!(cached.cache().read().await.is_empty());
        assert!(cached.get(&path).await.unwrap().is_none());
    }
}
