//! Cache Store Module
//!
//! The value-caching half of the subsystem: the [`CacheStore`] capability
//! trait, the miss sentinel, and the in-process reference implementation
//! with lazy TTL expiry and an LRU entry bound.

mod entry;
mod local;
mod lru;
mod stats;
mod traits;


pub(crate) use entry::now_millis;

// Re-export public types
pub use entry::CacheEntry;
pub use local::{global_cache_store, LocalCacheStore};
pub use stats::CacheStats;
pub use traits::{CacheStore, Lookup};

// == Public Constants ==
/// Entry bound of locally-built stores unless configured otherwise.
pub const DEFAULT_MAX_ENTRIES: usize = 128;
