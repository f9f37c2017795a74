//! Store capability trait and the cache-miss sentinel
//!
//! Any backend providing these operations with the stated atomicity rules is
//! a drop-in substitute for the in-process store; this is the integration
//! point for fleet-wide shared caching.

use async_trait::async_trait;

use crate::config::Ttl;
use crate::error::StoreError;
use crate::key::CacheKey;

// == Lookup ==
/// Result of a cache read: the value, or the distinguished miss sentinel.
///
/// Deliberately not `Option`: a stored value that is itself empty or
/// null-like can never be mistaken for "no entry", and `Miss` is never a
/// legal stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// A live, unexpired entry was found
    Hit(T),
    /// No entry, or the entry's TTL had elapsed
    Miss,
}

impl<T> Lookup<T> {
    /// Returns true for [`Lookup::Hit`].
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// Returns true for [`Lookup::Miss`].
    pub fn is_miss(&self) -> bool {
        matches!(self, Lookup::Miss)
    }

    /// Converts into `Option`, discarding the hit/miss distinction.
    pub fn into_hit(self) -> Option<T> {
        match self {
            Lookup::Hit(v) => Some(v),
            Lookup::Miss => None,
        }
    }
}

// == Cache Store ==
/// Pluggable key→value store with TTL expiry.
///
/// Implementations must guarantee:
/// - `get` never blocks beyond the underlying storage call, and a backend
///   failure surfaces as [`StoreError`], never as a miss;
/// - `set` overwrites unconditionally;
/// - `delete` is idempotent;
/// - `exists` is true only for a present, unexpired entry.
#[async_trait]
pub trait CacheStore<T>: Send + Sync {
    /// Reads the value for `key`, or [`Lookup::Miss`] if absent or expired.
    async fn get(&self, key: &CacheKey) -> Result<Lookup<T>, StoreError>;

    /// Writes `value` under `key`, replacing any existing entry and
    /// resetting its TTL.
    async fn set(&self, key: &CacheKey, value: &T, ttl: Ttl) -> Result<(), StoreError>;

    /// Removes the entry for `key`. Returns whether an entry was present;
    /// deleting an absent key is not an error.
    async fn delete(&self, key: &CacheKey) -> Result<bool, StoreError>;

    /// Reports whether a live entry exists for `key`.
    async fn exists(&self, key: &CacheKey) -> Result<bool, StoreError>;
}
