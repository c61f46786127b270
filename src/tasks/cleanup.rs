//! Cache Cleanup Task
//!
//! Background task that periodically drops expired cached documents.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a task that sweeps expired entries every `cleanup_interval_secs`.
///
/// The task runs until aborted; `main` aborts it during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = cache::shared(CacheStore::new(1000, 300));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 5);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: SharedCache, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting cache cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let (removed, remaining) = {
                let mut cache_guard = cache.write().await;
                let removed = cache_guard.cleanup_expired();
                (removed, cache_guard.len())
            };

            if removed > 0 {
                info!(
                    "Cache cleanup: removed {} expired documents, {} remain",
                    removed, remaining
                );
            } else {
                debug!("Cache cleanup: no expired documents found");
            }
        }
    })
}
