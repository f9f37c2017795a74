//! Local Cache Store
//!
//! In-process reference implementation of [`CacheStore`]: a HashMap of
//! serialized payloads with lazy TTL expiry, an LRU entry bound, and traffic
//! statistics. Every operation takes one short-held mutex and completes
//! without suspending, so map mutations are atomic with respect to other
//! tasks regardless of runtime flavor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::config::Ttl;
use crate::error::StoreError;
use crate::key::CacheKey;
use crate::store::entry::CacheEntry;
use crate::store::lru::LruTracker;
use crate::store::stats::CacheStats;
use crate::store::traits::{CacheStore, Lookup};
use crate::store::DEFAULT_MAX_ENTRIES;

// == Shelf ==
/// Everything guarded by the store mutex.
#[derive(Debug, Default)]
struct Shelf {
    entries: HashMap<CacheKey, CacheEntry>,
    lru: LruTracker,
    stats: CacheStats,
}

// == Local Cache Store ==
/// In-process cache store.
///
/// Values are held as `serde_json::Value`, so one store instance serves
/// memoizers of any payload type and never hands out live references;
/// every hit deserializes a fresh copy. Expiry is evaluated lazily: the read
/// that discovers an expired entry deletes it.
#[derive(Debug)]
pub struct LocalCacheStore {
    shelf: Mutex<Shelf>,
    /// Entry bound enforced by LRU eviction; 0 = unbounded
    max_entries: usize,
}

impl LocalCacheStore {
    /// Creates a store evicting least-recently-used entries beyond
    /// `max_entries` (0 = unbounded).
    pub fn new(max_entries: usize) -> Self {
        Self {
            shelf: Mutex::new(Shelf::default()),
            max_entries,
        }
    }

    fn shelf(&self) -> Result<MutexGuard<'_, Shelf>, StoreError> {
        self.shelf
            .lock()
            .map_err(|_| StoreError::Backend("local store mutex poisoned".to_string()))
    }

    /// Returns a snapshot of the store's traffic counters.
    pub fn stats(&self) -> Result<CacheStats, StoreError> {
        let shelf = self.shelf()?;
        let mut stats = shelf.stats.clone();
        stats.entries = shelf.entries.len();
        Ok(stats)
    }

    /// Current number of resident entries, expired ones included until a
    /// read or sweep removes them.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.shelf()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.shelf()?.entries.is_empty())
    }

    /// Removes every expired entry, returning how many were dropped.
    ///
    /// Correctness never requires this (expiry is checked on read), but the
    /// sweeper task calls it to bound memory held by keys nobody reads again.
    pub fn sweep(&self) -> Result<usize, StoreError> {
        let mut shelf = self.shelf()?;

        let expired: Vec<CacheKey> = shelf
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            shelf.entries.remove(key);
            shelf.lru.remove(key);
            shelf.stats.record_expiration();
        }

        Ok(expired.len())
    }

    // Raw operations over the serialized payload; the typed trait impl
    // layers the codec on top.

    fn get_raw(&self, key: &CacheKey) -> Result<Lookup<serde_json::Value>, StoreError> {
        let mut shelf = self.shelf()?;

        let entry = match shelf.entries.get(key) {
            Some(entry) => entry.clone(),
            None => {
                shelf.stats.record_miss();
                return Ok(Lookup::Miss);
            }
        };

        if entry.is_expired() {
            // Self-cleaning read: the discovery deletes the corpse.
            shelf.entries.remove(key);
            shelf.lru.remove(key);
            shelf.stats.record_expiration();
            shelf.stats.record_miss();
            return Ok(Lookup::Miss);
        }

        shelf.lru.touch(key);
        shelf.stats.record_hit();
        Ok(Lookup::Hit(entry.value))
    }

    fn set_raw(
        &self,
        key: &CacheKey,
        value: serde_json::Value,
        ttl: Ttl,
    ) -> Result<(), StoreError> {
        let mut shelf = self.shelf()?;

        shelf.entries.insert(key.clone(), CacheEntry::new(value, ttl));
        shelf.lru.touch(key);

        if self.max_entries > 0 {
            while shelf.entries.len() > self.max_entries {
                match shelf.lru.evict_oldest() {
                    Some(oldest) => {
                        shelf.entries.remove(&oldest);
                        shelf.stats.record_eviction();
                    }
                    None => break,
                }
            }
        }

        Ok(())
    }

    fn delete_raw(&self, key: &CacheKey) -> Result<bool, StoreError> {
        let mut shelf = self.shelf()?;
        let removed = shelf.entries.remove(key).is_some();
        if removed {
            shelf.lru.remove(key);
        }
        Ok(removed)
    }

    fn exists_raw(&self, key: &CacheKey) -> Result<bool, StoreError> {
        let mut shelf = self.shelf()?;

        let expired = match shelf.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return Ok(false),
        };

        if expired {
            shelf.entries.remove(key);
            shelf.lru.remove(key);
            shelf.stats.record_expiration();
            return Ok(false);
        }

        Ok(true)
    }
}

impl Default for LocalCacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

// == Cache Store Impl ==
#[async_trait]
impl<T> CacheStore<T> for LocalCacheStore
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &CacheKey) -> Result<Lookup<T>, StoreError> {
        match self.get_raw(key)? {
            Lookup::Hit(value) => {
                let typed = serde_json::from_value(value).map_err(StoreError::Decode)?;
                Ok(Lookup::Hit(typed))
            }
            Lookup::Miss => Ok(Lookup::Miss),
        }
    }

    async fn set(&self, key: &CacheKey, value: &T, ttl: Ttl) -> Result<(), StoreError> {
        let payload = serde_json::to_value(value).map_err(StoreError::Encode)?;
        self.set_raw(key, payload, ttl)
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, StoreError> {
        self.delete_raw(key)
    }

    async fn exists(&self, key: &CacheKey) -> Result<bool, StoreError> {
        self.exists_raw(key)
    }
}

// == Process-Wide Default ==
/// The process-lifetime default store, created on first use.
///
/// Shared by every memoizer that does not inject its own store; keys are
/// namespaced by computation name, so tenants cannot collide. Tests should
/// inject fresh [`LocalCacheStore`] instances instead of relying on this.
pub fn global_cache_store() -> Arc<LocalCacheStore> {
    static STORE: OnceLock<Arc<LocalCacheStore>> = OnceLock::new();
    STORE
        .get_or_init(|| Arc::new(LocalCacheStore::new(DEFAULT_MAX_ENTRIES)))
        .clone()
}
