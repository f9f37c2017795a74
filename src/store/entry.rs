//! Cache Entry Module
//!
//! Defines the record a cache store keeps per key: an opaque serialized
//! payload plus its expiry deadline.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Ttl;

// == Cache Entry ==
/// A single stored value with TTL metadata.
///
/// The payload is kept in serialized form (`serde_json::Value`) so the store
/// never shares live references with callers; every read deserializes a
/// fresh copy.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored payload
    pub value: serde_json::Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = never expires
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    /// Creates an entry expiring `ttl` after now.
    pub fn new(value: serde_json::Value, ttl: Ttl) -> Self {
        let now = now_millis();
        let expires_at = match ttl {
            Ttl::Never => None,
            Ttl::After(d) => Some(now + d.as_millis() as u64),
        };

        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    /// Checks whether the entry's TTL has elapsed.
    ///
    /// Boundary: an entry is expired once the current time reaches
    /// `expires_at`, so a TTL of `d` makes the entry unreadable exactly `d`
    /// after creation, never before.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => now_millis() >= expires,
            None => false,
        }
    }

    /// Returns remaining TTL in milliseconds, or None if the entry never
    /// expires. Expired entries report `Some(0)`.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at.map(|expires| {
            let now = now_millis();
            expires.saturating_sub(now)
        })
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
