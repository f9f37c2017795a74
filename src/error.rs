//! Error types for the memoization subsystem
//!
//! Provides unified error handling using thiserror. The taxonomy keeps
//! backend failures, lock timeouts, and computation errors strictly apart:
//! a store failure is never reported as a miss, and a wrapped computation's
//! error is never swallowed or cached.

use thiserror::Error;

use crate::key::CacheKey;

// == Store Error ==
/// Backend failure on a store operation.
///
/// Raised by [`CacheStore`](crate::store::CacheStore) and
/// [`SentinelStore`](crate::lock::SentinelStore) implementations. Never
/// conflated with a cache miss.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O failure talking to the backend (network, disk, remote service)
    #[error("store backend failure: {0}")]
    Backend(String),

    /// Value could not be serialized for storage
    #[error("payload encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Stored payload could not be deserialized back into the caller's type
    #[error("payload decoding failed: {0}")]
    Decode(#[source] serde_json::Error),
}

// == Key Error ==
/// Argument values could not be serialized into a cache key.
#[derive(Error, Debug)]
#[error("cache key derivation failed: {0}")]
pub struct KeyError(#[from] serde_json::Error);

// == Timeout Kind ==
/// Which error a lock reports once its wait budget is exhausted.
///
/// `Locked` tells the caller "contended, try later"; `Stampede` tells it
/// "a computation for this key is already in flight, do not even retry."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    Locked,
    Stampede,
}

// == Lock Error ==
/// Error surface of [`Lock::acquire`](crate::lock::Lock::acquire).
#[derive(Error, Debug)]
pub enum LockError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Accumulated wait exceeded `maxwait_ms` while another holder kept the key
    #[error("lock wait exceeded for key {key}")]
    Timeout { key: CacheKey, kind: TimeoutKind },
}

// == Memo Error ==
/// Error surface of a memoized call.
///
/// `E` is the wrapped computation's own error type, propagated untouched
/// via [`MemoError::Compute`].
#[derive(Error, Debug)]
pub enum MemoError<E> {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Key(#[from] KeyError),

    /// Lock acquisition timed out while another caller held the key
    #[error("key {key} is locked")]
    Locked { key: CacheKey },

    /// A computation for this key is already in flight and waiting is disallowed
    #[error("computation already in flight for key {key}")]
    Stampede { key: CacheKey },

    /// The wrapped computation failed; nothing was cached
    #[error("computation failed: {0}")]
    Compute(E),
}

impl<E> From<LockError> for MemoError<E> {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Store(e) => MemoError::Store(e),
            LockError::Timeout {
                key,
                kind: TimeoutKind::Locked,
            } => MemoError::Locked { key },
            LockError::Timeout {
                key,
                kind: TimeoutKind::Stampede,
            } => MemoError::Stampede { key },
        }
    }
}

// == Invalidate Error ==
/// Error surface of the [`Invalidator`](crate::memo::Invalidator).
#[derive(Error, Debug)]
pub enum InvalidateError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The key's lock could not be acquired within the wait budget
    #[error("key {key} is locked")]
    Locked { key: CacheKey },
}

impl From<LockError> for InvalidateError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Store(e) => InvalidateError::Store(e),
            // Either timeout kind means the same thing to an invalidator:
            // someone else holds the key right now.
            LockError::Timeout { key, .. } => InvalidateError::Locked { key },
        }
    }
}
