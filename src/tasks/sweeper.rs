//! TTL Sweeper Task
//!
//! Background task that periodically removes expired entries from a local
//! store. Lazy expiry on read already guarantees correctness; the sweeper
//! only bounds memory held by keys nobody reads again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::store::LocalCacheStore;

/// Spawns a task sweeping `store` every `interval`.
///
/// Runs until aborted; hold the returned handle and call `abort()` during
/// shutdown.
///
/// # Example
/// ```ignore
/// let store = Arc::new(LocalCacheStore::new(0));
/// let sweeper = spawn_sweeper_task(store.clone(), Duration::from_secs(30));
/// // later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_sweeper_task(store: Arc<LocalCacheStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "ttl sweeper started");

        loop {
            tokio::time::sleep(interval).await;

            match store.sweep() {
                Ok(0) => debug!("ttl sweep: nothing expired"),
                Ok(removed) => info!(removed, "ttl sweep: removed expired entries"),
                Err(err) => warn!(error = %err, "ttl sweep failed"),
            }
        }
    })
}
