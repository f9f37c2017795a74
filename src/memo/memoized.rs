//! Memoizer Module
//!
//! [`Memoized`] wraps an async computation with cache-then-compute
//! semantics: consult the store, and on a miss take the key's lock so at
//! most one caller computes while the rest wait for (or bail out on) the
//! winner's result.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{MemoOptions, Ttl};
use crate::error::MemoError;
use crate::key::KeyCodec;
use crate::lock::{global_sentinel_store, Lock, SentinelStore};
use crate::memo::invalidate::Invalidator;
use crate::store::{global_cache_store, CacheStore, LocalCacheStore, Lookup};

/// Type-erased computation: arguments in, future of a result out.
pub(crate) type Compute<A, T, E> =
    Arc<dyn Fn(A) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send>> + Send + Sync>;

// == Memoized ==
/// A computation wrapped with caching and stampede suppression.
///
/// `A` is the argument type (serialized into the cache key), `T` the cached
/// output, `E` the computation's own error type. The wrapper holds no
/// mutable state of its own; everything shared lives behind the store and
/// sentinel interfaces, so a remote backend drops in without touching this
/// logic.
pub struct Memoized<A, T, E> {
    codec: KeyCodec,
    store: Arc<dyn CacheStore<T>>,
    lock: Lock,
    ttl: Ttl,
    f: Compute<A, T, E>,
}

impl<A, T, E> Memoized<A, T, E>
where
    A: Serialize + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Starts building a memoizer for `f`, registered under `name`.
    ///
    /// The name namespaces cache keys, so it must be unique per computation
    /// and stable across restarts when a shared store is in play.
    pub fn builder<F, Fut>(name: impl Into<String>, f: F) -> MemoBuilder<A, T, E>
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        MemoBuilder {
            name: name.into(),
            f: Arc::new(move |args| Box::pin(f(args))),
            opts: MemoOptions::default(),
            store: None,
            sentinels: None,
        }
    }

    /// The computation name this memoizer was registered under.
    pub fn name(&self) -> &str {
        self.codec.name()
    }

    /// An [`Invalidator`] sharing this memoizer's key codec, store, and
    /// lock, so it targets exactly the entries future calls would hit.
    pub fn invalidator(&self) -> Invalidator<T> {
        Invalidator::new(
            self.codec.clone(),
            Arc::clone(&self.store),
            self.lock.clone(),
        )
    }

    /// Invokes the computation through the cache.
    ///
    /// Hit: returns the cached value, no lock taken. Miss: acquires the
    /// key's lock, re-checks the store (another caller may have finished
    /// while this one waited), and only on a confirmed miss runs the
    /// computation (once, with no retry), stores the result, releases, and
    /// returns. The lock is released on every exit path; a failed
    /// computation stores nothing.
    ///
    /// # Errors
    /// - [`MemoError::Locked`] / [`MemoError::Stampede`] per the configured
    ///   timeout kind, when the wait budget runs out;
    /// - [`MemoError::Store`] on backend failure (never reported as a miss);
    /// - [`MemoError::Compute`] carrying the computation's own error.
    pub async fn call(&self, args: A) -> Result<T, MemoError<E>> {
        let key = self.codec.encode(&args)?;

        if let Lookup::Hit(value) = self.store.get(&key).await? {
            debug!(key = %key, "cache hit");
            return Ok(value);
        }

        let guard = self.lock.acquire(&key).await?;

        // Double-check: the winner may have populated the entry and released
        // while this caller was polling for the lock.
        match self.store.get(&key).await {
            Ok(Lookup::Hit(value)) => {
                debug!(key = %key, "cache hit after lock wait");
                guard.release().await?;
                return Ok(value);
            }
            Ok(Lookup::Miss) => {}
            Err(err) => {
                release_quietly(guard).await;
                return Err(err.into());
            }
        }

        debug!(key = %key, "cache miss, computing");
        match (self.f)(args).await {
            Ok(value) => {
                // Store before releasing, so a waiter that wins the lock
                // next observes the finished result.
                let stored = self.store.set(&key, &value, self.ttl).await;
                match stored {
                    Ok(()) => {
                        guard.release().await?;
                        Ok(value)
                    }
                    Err(err) => {
                        release_quietly(guard).await;
                        Err(err.into())
                    }
                }
            }
            Err(err) => {
                // A failed computation must not poison the cache.
                release_quietly(guard).await;
                Err(MemoError::Compute(err))
            }
        }
    }
}

/// Release on an error path: the original error is the one the caller needs,
/// so a release failure is only logged.
async fn release_quietly(guard: crate::lock::LockGuard) {
    let key = guard.key().clone();
    if let Err(err) = guard.release().await {
        warn!(key = %key, error = %err, "lock release failed on error path");
    }
}

// == Memo Builder ==
/// Builder for [`Memoized`]; see [`MemoOptions`] for the knobs.
pub struct MemoBuilder<A, T, E> {
    name: String,
    f: Compute<A, T, E>,
    opts: MemoOptions,
    store: Option<Arc<dyn CacheStore<T>>>,
    sentinels: Option<Arc<dyn SentinelStore>>,
}

impl<A, T, E> MemoBuilder<A, T, E> {
    /// Replaces the whole option set.
    pub fn options(mut self, opts: MemoOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Entry lifetime; [`Ttl::Never`] (the default) disables expiry.
    pub fn ttl(mut self, ttl: Ttl) -> Self {
        self.opts.ttl = ttl;
        self
    }

    /// Wait budget for callers losing the miss race; 0 = fail immediately.
    pub fn maxwait_ms(mut self, ms: u64) -> Self {
        self.opts.maxwait_ms = ms;
        self
    }

    /// Poll interval while waiting on the winner.
    pub fn pulse_ms(mut self, ms: u64) -> Self {
        self.opts.pulse_ms = ms;
        self
    }

    /// Lease on the per-key computation lock.
    pub fn lease_ms(mut self, ms: u64) -> Self {
        self.opts.lease_ms = ms;
        self
    }

    /// Error kind reported on lock timeout.
    pub fn timeout_kind(mut self, kind: crate::error::TimeoutKind) -> Self {
        self.opts.timeout_kind = kind;
        self
    }

    /// Gives this memoizer a private [`LocalCacheStore`] bounded to `n`
    /// entries (0 = private and unbounded) instead of sharing the
    /// process-wide store.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.opts.max_entries = Some(n);
        self
    }

    /// Injects a cache store (a fresh local one for tests, or a shared
    /// remote backend). Without this, the builder uses the process-wide
    /// default, or a private [`LocalCacheStore`] when
    /// [`max_entries`](Self::max_entries) was set.
    pub fn store(mut self, store: Arc<dyn CacheStore<T>>) -> Self {
        self.store = Some(store);
        self
    }

    /// Injects a sentinel backend; defaults to the process-wide sentinel
    /// store.
    pub fn sentinels(mut self, sentinels: Arc<dyn SentinelStore>) -> Self {
        self.sentinels = Some(sentinels);
        self
    }

    /// Finishes the memoizer.
    pub fn build(self) -> Memoized<A, T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let store = self.store.unwrap_or_else(|| match self.opts.max_entries {
            Some(bound) => Arc::new(LocalCacheStore::new(bound)),
            None => {
                let shared: Arc<dyn CacheStore<T>> = global_cache_store();
                shared
            }
        });
        let sentinels = self.sentinels.unwrap_or_else(|| {
            let shared: Arc<dyn SentinelStore> = global_sentinel_store();
            shared
        });

        Memoized {
            codec: KeyCodec::new(self.name),
            store,
            lock: Lock::new(sentinels, self.opts.lock_options()),
            ttl: self.opts.ttl,
            f: self.f,
        }
    }
}
