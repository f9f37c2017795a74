//! Sentinel Store Module
//!
//! A sentinel store is structurally a key→token map but semantically a set
//! of ownership markers: a live token present under a key means "held". Its
//! conditional write is the primitive that makes lock acquisition atomic
//! under contention, in-process or against a shared backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::key::CacheKey;
use crate::store::now_millis;

// == Lock Token ==
/// Opaque proof of lock ownership.
///
/// Fresh for every acquisition attempt, so a release can verify it is
/// removing its own sentinel and not one written by a later holder that
/// reclaimed the key after lease expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockToken(Uuid);

impl LockToken {
    /// Mints a new, unique token.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

// == Sentinel Store ==
/// Pluggable token store backing a [`Lock`](crate::lock::Lock).
///
/// An expired token is indistinguishable from an absent one: every
/// operation must treat a sentinel whose lease deadline has passed as free
/// for the taking. `set_if_vacant` is the sole arbiter of who wins a
/// contended acquisition; a shared backend must make it atomic across
/// processes.
#[async_trait]
pub trait SentinelStore: Send + Sync {
    /// Returns the live token held under `key`, if any.
    async fn get(&self, key: &CacheKey) -> Result<Option<LockToken>, StoreError>;

    /// Atomically writes `token` with the given lease iff no live token is
    /// present. Returns whether the write won.
    async fn set_if_vacant(
        &self,
        key: &CacheKey,
        token: LockToken,
        lease: Duration,
    ) -> Result<bool, StoreError>;

    /// Deletes the sentinel iff it still carries `token`. Returns whether
    /// anything was deleted.
    async fn delete_if_held(&self, key: &CacheKey, token: &LockToken)
        -> Result<bool, StoreError>;
}

// == Local Sentinel Store ==
#[derive(Debug, Clone)]
struct Sentinel {
    token: LockToken,
    /// Lease deadline (Unix milliseconds); past this, the token is dead
    expires_at: u64,
}

impl Sentinel {
    fn is_live(&self) -> bool {
        now_millis() < self.expires_at
    }
}

/// In-process reference implementation of [`SentinelStore`].
///
/// One short-held mutex per operation; nothing suspends while it is held,
/// so the conditional write is atomic with respect to every other task.
#[derive(Debug, Default)]
pub struct LocalSentinelStore {
    sentinels: Mutex<HashMap<CacheKey, Sentinel>>,
}

impl LocalSentinelStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sentinels(&self) -> Result<MutexGuard<'_, HashMap<CacheKey, Sentinel>>, StoreError> {
        self.sentinels
            .lock()
            .map_err(|_| StoreError::Backend("sentinel store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl SentinelStore for LocalSentinelStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<LockToken>, StoreError> {
        let mut sentinels = self.sentinels()?;

        match sentinels.get(key) {
            Some(sentinel) if sentinel.is_live() => Ok(Some(sentinel.token)),
            Some(_) => {
                // Dead token; clean it up on discovery.
                sentinels.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_if_vacant(
        &self,
        key: &CacheKey,
        token: LockToken,
        lease: Duration,
    ) -> Result<bool, StoreError> {
        let mut sentinels = self.sentinels()?;

        if let Some(existing) = sentinels.get(key) {
            if existing.is_live() {
                return Ok(false);
            }
            // Expired sentinel: reclaimable, fall through and overwrite.
        }

        sentinels.insert(
            key.clone(),
            Sentinel {
                token,
                expires_at: now_millis() + lease.as_millis() as u64,
            },
        );
        Ok(true)
    }

    async fn delete_if_held(
        &self,
        key: &CacheKey,
        token: &LockToken,
    ) -> Result<bool, StoreError> {
        let mut sentinels = self.sentinels()?;

        match sentinels.get(key) {
            Some(sentinel) if sentinel.token == *token => {
                sentinels.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// == Process-Wide Default ==
/// The process-lifetime default sentinel store, created on first use.
///
/// Memoizers that do not inject their own sentinels coordinate through this
/// instance; cache keys are namespaced per computation, so independent
/// memoizers never contend. Tests should inject fresh instances.
pub fn global_sentinel_store() -> Arc<LocalSentinelStore> {
    static STORE: OnceLock<Arc<LocalSentinelStore>> = OnceLock::new();
    STORE.get_or_init(|| Arc::new(LocalSentinelStore::new())).clone()
}
