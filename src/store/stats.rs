//! Cache Statistics Module
//!
//! Counters the local store keeps about its own traffic: hits, misses,
//! lazy expirations, and LRU evictions.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of a store's performance counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads that returned a live entry
    pub hits: u64,
    /// Reads that found no usable entry
    pub misses: u64,
    /// Entries removed lazily because their TTL had elapsed
    pub expirations: u64,
    /// Entries removed by the LRU bound
    pub evictions: u64,
    /// Entries currently resident
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of reads served from cache, 0.0 when no reads happened.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}
