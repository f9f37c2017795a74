//! Integration Tests for the Memoizer
//!
//! End-to-end scenarios: stampede suppression under heavy concurrency, TTL
//! expiry, invalidation, and timeout error configuration.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use memolock::{
    LocalCacheStore, LocalSentinelStore, MemoError, Memoized, TimeoutKind, Ttl,
};
use tokio_test::assert_ok;
use tracing_subscriber::EnvFilter;

// == Helper Functions ==

/// Routes crate logs into the test harness when `RUST_LOG` is set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A memoized "expensive" computation: sleeps `delay`, counts invocations,
/// and returns `n * 2`. Fresh stores per call, so tests never share state.
fn slow_double(
    counter: Arc<AtomicUsize>,
    delay: Duration,
) -> memolock::MemoBuilder<u64, u64, Infallible> {
    Memoized::builder("slow_double", move |n: u64| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            Ok(n * 2)
        }
    })
    .store(Arc::new(LocalCacheStore::new(0)))
    .sentinels(Arc::new(LocalSentinelStore::new()))
}

// == Stampede Suppression ==

#[tokio::test]
async fn test_fifty_concurrent_callers_compute_once() {
    init_tracing();
    let counter = Arc::new(AtomicUsize::new(0));
    let delay = Duration::from_millis(400);
    let memo = Arc::new(
        slow_double(Arc::clone(&counter), delay)
            .maxwait_ms(10_000)
            .pulse_ms(20)
            .build(),
    );

    let started = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..50 {
        let memo = Arc::clone(&memo);
        handles.push(tokio::spawn(async move { memo.call(21).await }));
    }

    for handle in handles {
        let value = handle.await.unwrap().unwrap();
        assert_eq!(value, 42, "every caller sees the winner's result");
    }

    assert_eq!(
        counter.load(Ordering::SeqCst),
        1,
        "exactly one underlying computation"
    );
    // All 50 finish in roughly one compute delay, not fifty.
    assert!(
        started.elapsed() < delay * 4,
        "callers waited for the winner instead of serializing: {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_failfast_losers_get_stampede() {
    init_tracing();
    let counter = Arc::new(AtomicUsize::new(0));
    let memo = Arc::new(
        slow_double(Arc::clone(&counter), Duration::from_millis(300))
            .maxwait_ms(0)
            .build(),
    );

    let winner = {
        let memo = Arc::clone(&memo);
        tokio::spawn(async move { memo.call(5).await })
    };

    // Let the winner take the lock and start computing.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = memo.call(5).await.unwrap_err();
    assert!(matches!(err, MemoError::Stampede { .. }));

    assert_eq!(winner.await.unwrap().unwrap(), 10);
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    // The result is cached now; late callers hit without contention.
    assert_eq!(memo.call(5).await.unwrap(), 10);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_timeout_kind_locked_is_respected() {
    init_tracing();
    let counter = Arc::new(AtomicUsize::new(0));
    let memo = Arc::new(
        slow_double(Arc::clone(&counter), Duration::from_millis(300))
            .maxwait_ms(0)
            .timeout_kind(TimeoutKind::Locked)
            .build(),
    );

    let winner = {
        let memo = Arc::clone(&memo);
        tokio::spawn(async move { memo.call(5).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = memo.call(5).await.unwrap_err();
    assert!(matches!(err, MemoError::Locked { .. }));

    winner.await.unwrap().unwrap();
}

// == TTL Expiry ==

#[tokio::test]
async fn test_expired_entry_recomputes() {
    init_tracing();
    let counter = Arc::new(AtomicUsize::new(0));
    let memo = slow_double(Arc::clone(&counter), Duration::from_millis(10))
        .ttl(Ttl::After(Duration::from_secs(1)))
        .build();

    assert_eq!(memo.call(3).await.unwrap(), 6);
    assert_eq!(memo.call(3).await.unwrap(), 6);
    assert_eq!(counter.load(Ordering::SeqCst), 1, "second call was a hit");

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(memo.call(3).await.unwrap(), 6);
    assert_eq!(
        counter.load(Ordering::SeqCst),
        2,
        "entry expired, so the third call recomputed"
    );
}

// == Invalidation ==

#[tokio::test]
async fn test_invalidate_forces_recompute() {
    init_tracing();
    let counter = Arc::new(AtomicUsize::new(0));
    let memo = slow_double(Arc::clone(&counter), Duration::from_millis(10)).build();
    let invalidator = memo.invalidator();

    assert_eq!(memo.call(4).await.unwrap(), 8);
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    // The entry has no TTL; only invalidation can remove it.
    assert!(invalidator.invalidate(&4u64).await.unwrap());

    assert_eq!(memo.call(4).await.unwrap(), 8);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_invalidate_unrelated_args_keeps_cache_warm() {
    init_tracing();
    let counter = Arc::new(AtomicUsize::new(0));
    let memo = slow_double(Arc::clone(&counter), Duration::from_millis(10)).build();
    let invalidator = memo.invalidator();

    memo.call(4).await.unwrap();
    assert!(!invalidator.invalidate(&5u64).await.unwrap());

    memo.call(4).await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1, "entry for 4 survived");
}

#[tokio::test]
async fn test_invalidate_locked_blocks_recache_until_release() {
    init_tracing();
    let counter = Arc::new(AtomicUsize::new(0));
    let memo = Arc::new(
        slow_double(Arc::clone(&counter), Duration::from_millis(10))
            .maxwait_ms(0)
            .build(),
    );
    let invalidator = memo.invalidator();

    memo.call(9).await.unwrap();

    let guard = invalidator.invalidate_locked(&9u64).await.unwrap();

    // While the mutation is uncommitted, fail-fast callers are refused
    // rather than re-caching the old state.
    let err = memo.call(9).await.unwrap_err();
    assert!(matches!(err, MemoError::Stampede { .. }));

    assert_ok!(guard.release().await);

    assert_eq!(memo.call(9).await.unwrap(), 18);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

// == Store Injection ==

#[tokio::test]
async fn test_injected_stores_isolate_instances() {
    init_tracing();
    let counter = Arc::new(AtomicUsize::new(0));

    // Same computation name, separate injected stores: no crosstalk.
    let a = slow_double(Arc::clone(&counter), Duration::from_millis(10)).build();
    let b = slow_double(Arc::clone(&counter), Duration::from_millis(10)).build();

    a.call(6).await.unwrap();
    b.call(6).await.unwrap();

    assert_eq!(
        counter.load(Ordering::SeqCst),
        2,
        "each instance computed against its own store"
    );
}

// == Error Propagation ==

#[tokio::test]
async fn test_compute_error_propagates_and_poisons_nothing() {
    init_tracing();
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_in = Arc::clone(&attempts);

    let memo: Memoized<u64, u64, String> = Memoized::builder("fragile", move |n: u64| {
        let attempts = Arc::clone(&attempts_in);
        async move {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(format!("upstream down for {n}"))
            } else {
                Ok(n + 1)
            }
        }
    })
    .store(Arc::new(LocalCacheStore::new(0)))
    .sentinels(Arc::new(LocalSentinelStore::new()))
    .build();

    // Two failures, neither cached, lock released each time.
    assert!(matches!(
        memo.call(1).await.unwrap_err(),
        MemoError::Compute(_)
    ));
    assert!(matches!(
        memo.call(1).await.unwrap_err(),
        MemoError::Compute(_)
    ));

    // Third attempt succeeds and is cached.
    assert_eq!(memo.call(1).await.unwrap(), 2);
    assert_eq!(memo.call(1).await.unwrap(), 2);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}
