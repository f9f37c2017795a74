//! Integration Tests for the Lock
//!
//! Timing-sensitive scenarios: deterministic timeout bounds, lease reclaim,
//! and waiter behavior under cancellation.

use std::time::{Duration, Instant};

use memolock::{CacheKey, Lock, LockError, LockOptions, TimeoutKind};
use tokio_test::assert_ok;
use tracing_subscriber::EnvFilter;

// == Helper Functions ==

fn key(s: &str) -> CacheKey {
    CacheKey::from_raw(s)
}

/// Routes crate logs into the test harness when `RUST_LOG` is set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// == Timeout Bounds ==

#[tokio::test]
async fn test_timeout_lands_between_maxwait_and_one_pulse_past() {
    init_tracing();
    let maxwait = 250u64;
    let pulse = 50u64;
    let lock = Lock::local(LockOptions::default().maxwait_ms(maxwait).pulse_ms(pulse));

    // Hold the key and never release.
    let _guard = lock.acquire(&key("held")).await.unwrap();

    let started = Instant::now();
    let err = lock.acquire(&key("held")).await.unwrap_err();
    let waited = started.elapsed();

    assert!(matches!(
        err,
        LockError::Timeout {
            kind: TimeoutKind::Locked,
            ..
        }
    ));
    assert!(
        waited >= Duration::from_millis(maxwait),
        "failed too early: {waited:?}"
    );
    // One pulse of overshoot is allowed, plus scheduler slack.
    assert!(
        waited < Duration::from_millis(maxwait + pulse + 100),
        "failed too late: {waited:?}"
    );
}

#[tokio::test]
async fn test_zero_maxwait_fails_without_sleeping() {
    init_tracing();
    let lock = Lock::local(LockOptions::default().maxwait_ms(0).pulse_ms(100));

    let _guard = lock.acquire(&key("held")).await.unwrap();

    let started = Instant::now();
    let err = lock.acquire(&key("held")).await.unwrap_err();

    assert!(matches!(err, LockError::Timeout { .. }));
    assert!(
        started.elapsed() < Duration::from_millis(50),
        "fail-fast must not poll"
    );
}

#[tokio::test]
async fn test_configured_stampede_kind_is_reported() {
    init_tracing();
    let lock = Lock::local(
        LockOptions::default()
            .maxwait_ms(0)
            .timeout_kind(TimeoutKind::Stampede),
    );

    let _guard = lock.acquire(&key("held")).await.unwrap();
    let err = lock.acquire(&key("held")).await.unwrap_err();

    assert!(matches!(
        err,
        LockError::Timeout {
            kind: TimeoutKind::Stampede,
            ..
        }
    ));
}

// == Lease Reclaim ==

#[tokio::test]
async fn test_lease_expiry_makes_key_acquirable() {
    init_tracing();
    let lease = 200u64;
    let lock = Lock::local(
        LockOptions::default()
            .lease_ms(lease)
            .maxwait_ms(1_000)
            .pulse_ms(25),
    );

    // Simulates a crashed holder: acquired, never released.
    let _abandoned = lock.acquire(&key("k")).await.unwrap();

    let started = Instant::now();
    let guard = lock.acquire(&key("k")).await.unwrap();
    let waited = started.elapsed();

    assert!(
        waited < Duration::from_millis(lease + 200),
        "reclaim should happen shortly after the lease elapses: {waited:?}"
    );
    assert_ok!(guard.release().await);
}

// == Cancellation ==

#[tokio::test]
async fn test_cancelled_waiter_leaves_no_trace() {
    init_tracing();
    let lock = Lock::local(LockOptions::default().maxwait_ms(5_000).pulse_ms(20));

    let guard = lock.acquire(&key("k")).await.unwrap();

    // A waiter starts polling, then its task is cancelled mid-wait.
    let waiter = {
        let lock = lock.clone();
        tokio::spawn(async move { lock.acquire(&key("k")).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    waiter.abort();
    assert!(waiter.await.unwrap_err().is_cancelled());

    // The holder is unaffected and the key releases cleanly.
    assert_ok!(guard.release().await);
    let guard = lock.acquire(&key("k")).await.unwrap();
    assert_ok!(guard.release().await);
}

#[tokio::test]
async fn test_cancelled_waiter_does_not_stall_other_waiters() {
    init_tracing();
    let lock = Lock::local(LockOptions::default().maxwait_ms(5_000).pulse_ms(20));

    let guard = lock.acquire(&key("k")).await.unwrap();

    let doomed = {
        let lock = lock.clone();
        tokio::spawn(async move { lock.acquire(&key("k")).await })
    };
    let survivor = {
        let lock = lock.clone();
        tokio::spawn(async move { lock.acquire(&key("k")).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    doomed.abort();
    let _ = doomed.await;

    assert_ok!(guard.release().await);

    let guard = survivor.await.unwrap().unwrap();
    assert_ok!(guard.release().await);
}
