//! Configuration Module
//!
//! Option structs for locks and memoizers, with sensible defaults. All knobs
//! are plain data so callers can build configurations once and share them.

use std::time::Duration;

use crate::error::TimeoutKind;

// == Ttl ==
/// Time-to-live for a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Entry never expires; only eviction or invalidation removes it
    Never,
    /// Entry is treated as absent once this much time has elapsed
    After(Duration),
}

impl Ttl {
    /// Builds a TTL from milliseconds, where `0` means "never expires".
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            Ttl::Never
        } else {
            Ttl::After(Duration::from_millis(ms))
        }
    }

    /// Returns the TTL in milliseconds, or `None` for [`Ttl::Never`].
    pub fn as_millis(&self) -> Option<u64> {
        match self {
            Ttl::Never => None,
            Ttl::After(d) => Some(d.as_millis() as u64),
        }
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Ttl::Never
    }
}

// == Lock Options ==
/// Tuning for a [`Lock`](crate::lock::Lock).
///
/// Defaults make a fail-fast mutex: no waiting on contention, a 30-second
/// lease so a crashed holder cannot wedge the key forever.
#[derive(Debug, Clone)]
pub struct LockOptions {
    /// Token validity in millis; an unreleased token becomes reclaimable
    /// once the lease elapses
    pub lease_ms: u64,
    /// Total wait budget in millis; 0 = fail immediately on contention
    pub maxwait_ms: u64,
    /// Poll interval in millis while waiting for a held lock
    pub pulse_ms: u64,
    /// Error kind reported when the wait budget is exhausted
    pub timeout_kind: TimeoutKind,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            lease_ms: 30_000,
            maxwait_ms: 0,
            pulse_ms: 100,
            timeout_kind: TimeoutKind::Locked,
        }
    }
}

impl LockOptions {
    pub fn lease_ms(mut self, ms: u64) -> Self {
        self.lease_ms = ms;
        self
    }

    pub fn maxwait_ms(mut self, ms: u64) -> Self {
        self.maxwait_ms = ms;
        self
    }

    pub fn pulse_ms(mut self, ms: u64) -> Self {
        self.pulse_ms = ms;
        self
    }

    pub fn timeout_kind(mut self, kind: TimeoutKind) -> Self {
        self.timeout_kind = kind;
        self
    }
}

// == Memo Options ==
/// Tuning for a [`Memoized`](crate::memo::Memoized) computation.
///
/// Defaults suit a small, frequently-read dataset: entries never expire,
/// losers of a miss race wait up to a second for the winner's result, and a
/// timeout surfaces as [`Stampede`](crate::error::MemoError::Stampede).
#[derive(Debug, Clone)]
pub struct MemoOptions {
    /// Entry lifetime; [`Ttl::Never`] disables expiry
    pub ttl: Ttl,
    /// Lease on the per-key computation lock, in millis
    pub lease_ms: u64,
    /// How long a caller losing the miss race waits for the winner; 0 = bail
    /// out immediately
    pub maxwait_ms: u64,
    /// Poll interval while waiting, in millis
    pub pulse_ms: u64,
    /// Error kind reported on lock timeout.
    ///
    /// Defaults to [`TimeoutKind::Stampede`], not the bare
    /// [`LockOptions`] default of `Locked`: a memoizer timeout means a
    /// computation for the key is already in flight, which is worth telling
    /// the caller apart from plain contention.
    pub timeout_kind: TimeoutKind,
    /// Entry bound when the memoizer builds its own private store
    /// (0 = private and unbounded); `None` shares the process-wide store
    pub max_entries: Option<usize>,
}

impl Default for MemoOptions {
    fn default() -> Self {
        Self {
            ttl: Ttl::Never,
            lease_ms: 30_000,
            maxwait_ms: 1_000,
            pulse_ms: 100,
            timeout_kind: TimeoutKind::Stampede,
            max_entries: None,
        }
    }
}

impl MemoOptions {
    /// The lock configuration implied by these options.
    pub fn lock_options(&self) -> LockOptions {
        LockOptions {
            lease_ms: self.lease_ms,
            maxwait_ms: self.maxwait_ms,
            pulse_ms: self.pulse_ms,
            timeout_kind: self.timeout_kind,
        }
    }
}
