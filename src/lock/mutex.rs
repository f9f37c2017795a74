//! Lock Module
//!
//! Mutual exclusion over a [`SentinelStore`]: acquisition is one conditional
//! token write, contention is handled by polling with a fixed pulse, and a
//! lease bounds the damage of a holder that never releases. The same
//! protocol works against the in-process store or a shared backend, which
//! is why it polls instead of parking on a runtime-local notifier.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::LockOptions;
use crate::error::{LockError, StoreError};
use crate::key::CacheKey;
use crate::lock::sentinel::{LocalSentinelStore, LockToken, SentinelStore};

// == Lock ==
/// Per-key mutex with bounded wait and deterministic timeout.
///
/// Cheap to clone; clones share the same sentinel store and therefore
/// contend with each other.
#[derive(Clone)]
pub struct Lock {
    sentinels: Arc<dyn SentinelStore>,
    opts: LockOptions,
}

impl Lock {
    /// Builds a lock over any sentinel backend.
    pub fn new(sentinels: Arc<dyn SentinelStore>, opts: LockOptions) -> Self {
        Self { sentinels, opts }
    }

    /// Builds a lock over a private in-process sentinel store.
    ///
    /// Coordinates tasks within this process only; use [`Lock::new`] with a
    /// shared backend for cross-process exclusion.
    pub fn local(opts: LockOptions) -> Self {
        Self::new(Arc::new(LocalSentinelStore::new()), opts)
    }

    /// Returns the configured options.
    pub fn options(&self) -> &LockOptions {
        &self.opts
    }

    /// Acquires the lock for `key`.
    ///
    /// Tries the conditional token write; on conflict, sleeps `pulse_ms`
    /// (a cooperative yield, so other tasks progress) and retries until the
    /// accumulated wait reaches `maxwait_ms`, then fails with the configured
    /// timeout kind. With `maxwait_ms = 0` the first conflict fails
    /// immediately. A holder whose lease has elapsed is reclaimed on the
    /// spot.
    ///
    /// Cancelling a caller mid-wait is safe: nothing was written, so no
    /// cleanup is owed and other waiters are unaffected.
    ///
    /// # Errors
    /// [`LockError::Timeout`] when the wait budget runs out,
    /// [`LockError::Store`] on sentinel backend failure.
    pub async fn acquire(&self, key: &CacheKey) -> Result<LockGuard, LockError> {
        let token = LockToken::fresh();
        let lease = Duration::from_millis(self.opts.lease_ms);
        // A zero pulse would retry without advancing the wait clock.
        let pulse_ms = self.opts.pulse_ms.max(1);
        let pulse = Duration::from_millis(pulse_ms);
        let mut elapsed_ms: u64 = 0;

        loop {
            if self
                .sentinels
                .set_if_vacant(key, token, lease)
                .await?
            {
                debug!(key = %key, "lock acquired");
                return Ok(LockGuard {
                    sentinels: Arc::clone(&self.sentinels),
                    key: key.clone(),
                    token,
                });
            }

            if elapsed_ms >= self.opts.maxwait_ms {
                debug!(key = %key, elapsed_ms, "lock wait budget exhausted");
                return Err(LockError::Timeout {
                    key: key.clone(),
                    kind: self.opts.timeout_kind,
                });
            }

            tokio::time::sleep(pulse).await;
            elapsed_ms += pulse_ms;
        }
    }
}

impl std::fmt::Debug for Lock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock").field("opts", &self.opts).finish()
    }
}

// == Lock Guard ==
/// Proof of a held lock; release it explicitly on every exit path.
///
/// Release is asynchronous (a shared backend needs I/O to drop the
/// sentinel), so it cannot live in `Drop`. Leaking a guard is bounded by
/// the lease: the key becomes reclaimable once the lease elapses.
#[must_use = "an unreleased guard holds its key until the lease expires"]
pub struct LockGuard {
    sentinels: Arc<dyn SentinelStore>,
    key: CacheKey,
    token: LockToken,
}

impl LockGuard {
    /// The key this guard holds.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Releases the lock.
    ///
    /// Deletes the sentinel only if it still carries this guard's token;
    /// if the lease expired and someone else reclaimed the key, their
    /// sentinel is left untouched.
    pub async fn release(self) -> Result<(), StoreError> {
        let deleted = self
            .sentinels
            .delete_if_held(&self.key, &self.token)
            .await?;

        if deleted {
            debug!(key = %self.key, "lock released");
        } else {
            warn!(key = %self.key, "lease expired before release; key was reclaimed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("key", &self.key)
            .field("token", &self.token)
            .finish()
    }
}
