//! Invalidator Module
//!
//! Removes cached entries by the same key derivation the memoizer uses, so
//! invalidation targets exactly what a subsequent call would have hit.
//! Obtained from [`Memoized::invalidator`](crate::memo::Memoized::invalidator);
//! the handle is independent of the memoizer's argument and error types, so
//! mutation paths can hold one without dragging the computation along.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::InvalidateError;
use crate::key::KeyCodec;
use crate::lock::{Lock, LockGuard};
use crate::store::CacheStore;

// == Invalidator ==
/// Deletes cache entries for one memoized computation.
pub struct Invalidator<T> {
    codec: KeyCodec,
    store: Arc<dyn CacheStore<T>>,
    lock: Lock,
}

impl<T> Invalidator<T> {
    pub(crate) fn new(codec: KeyCodec, store: Arc<dyn CacheStore<T>>, lock: Lock) -> Self {
        Self { codec, store, lock }
    }

    /// Removes the entry the memoizer would hit for `args`.
    ///
    /// The arguments must match a memoized call exactly (same values, same
    /// shape) to land on the same key. Returns whether an entry existed;
    /// invalidating an uncached key is a no-op, not an error.
    pub async fn invalidate<A: Serialize>(&self, args: &A) -> Result<bool, InvalidateError> {
        let key = self.codec.encode(args)?;
        let removed = self.store.delete(&key).await?;
        debug!(key = %key, removed, "cache invalidated");
        Ok(removed)
    }

    /// Removes the entry while holding the key's lock, and hands the guard
    /// to the caller.
    ///
    /// Use this around a mutation of the underlying data: concurrent
    /// memoized calls cannot re-populate the entry until the caller releases
    /// the guard, so they observe the mutation's result rather than the
    /// value being replaced.
    ///
    /// # Errors
    /// [`InvalidateError::Locked`] when the key's lock cannot be acquired
    /// within the configured wait budget.
    pub async fn invalidate_locked<A: Serialize>(
        &self,
        args: &A,
    ) -> Result<LockGuard, InvalidateError> {
        let key = self.codec.encode(args)?;
        let guard = self.lock.acquire(&key).await?;

        match self.store.delete(&key).await {
            Ok(removed) => {
                debug!(key = %key, removed, "cache invalidated under lock");
                Ok(guard)
            }
            Err(err) => {
                // Surface the delete failure, not a leaked lock.
                let _ = guard.release().await;
                Err(err.into())
            }
        }
    }
}

impl<T> Clone for Invalidator<T> {
    fn clone(&self) -> Self {
        Self {
            codec: self.codec.clone(),
            store: Arc::clone(&self.store),
            lock: self.lock.clone(),
        }
    }
}
