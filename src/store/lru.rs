//! LRU Tracker Module
//!
//! Tracks key access order for eviction once the local store hits its entry
//! bound.

use std::collections::VecDeque;

use crate::key::CacheKey;

// == LRU Tracker ==
/// Access-order queue: front = most recently used, back = least.
#[derive(Debug, Default)]
pub(crate) struct LruTracker {
    order: VecDeque<CacheKey>,
}

impl LruTracker {
    pub(crate) fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    /// Marks a key as most recently used, inserting it if new.
    pub(crate) fn touch(&mut self, key: &CacheKey) {
        self.remove(key);
        self.order.push_front(key.clone());
    }

    /// Drops a key from the tracker; unknown keys are ignored.
    pub(crate) fn remove(&mut self, key: &CacheKey) {
        self.order.retain(|k| k != key);
    }

    /// Removes and returns the least recently used key, if any.
    pub(crate) fn evict_oldest(&mut self) -> Option<CacheKey> {
        self.order.pop_back()
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }
}
