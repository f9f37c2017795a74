//! memolock - memoization with TTL caching and stampede suppression
//!
//! Wraps an async computation so that repeated calls with equal arguments
//! are served from a pluggable cache, and concurrent callers racing the
//! same miss are collapsed into one computation: the first acquires a
//! per-key lock and computes, the rest wait for its result or bail out with
//! a [`Stampede`](MemoError::Stampede) error, never computing twice.
//!
//! The lock is usable on its own for shared-resource access control, and
//! both storage layers ([`CacheStore`] for values, [`SentinelStore`] for
//! lock tokens) are capability traits, so a networked backend drops in
//! without touching the coordination logic.
//!
//! ```ignore
//! use std::time::Duration;
//! use memolock::{Memoized, Ttl};
//!
//! let quote = Memoized::builder("quote", |symbol: String| async move {
//!     fetch_quote(&symbol).await // expensive upstream call
//! })
//! .ttl(Ttl::After(Duration::from_secs(60)))
//! .maxwait_ms(2_000)
//! .build();
//!
//! let price = quote.call("AAPL".to_string()).await?;
//! ```

pub mod config;
pub mod error;
pub mod key;
pub mod lock;
pub mod memo;
pub mod store;
pub mod tasks;

pub use config::{LockOptions, MemoOptions, Ttl};
pub use error::{InvalidateError, KeyError, LockError, MemoError, StoreError, TimeoutKind};
pub use key::{CacheKey, KeyCodec};
pub use lock::{
    global_sentinel_store, LocalSentinelStore, Lock, LockGuard, LockToken, SentinelStore,
};
pub use memo::{Invalidator, MemoBuilder, Memoized};
pub use store::{global_cache_store, CacheStats, CacheStore, LocalCacheStore, Lookup};
pub use tasks::spawn_sweeper_task;
