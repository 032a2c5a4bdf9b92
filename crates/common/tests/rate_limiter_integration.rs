//! Integration tests for the multi-window limiter
//!
//! Covers concurrent admission, the three overflow behaviors, and
//! cancellation of blocked waiters.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chainscan_common::resilience::{LimiterError, MultiWindowLimiter, OverflowBehavior, Window};
use chainscan_common::time::MockClock;
use tokio_util::sync::CancellationToken;

fn window(capacity: u32, millis: u64) -> Window {
    Window::new(capacity, Duration::from_millis(millis)).expect("valid window")
}

/// Hammers a frozen-clock limiter from many threads and checks that exactly
/// `capacity` grants are handed out per period, never more.
#[test]
fn test_concurrent_try_acquire_never_over_admits() {
    let clock = MockClock::new();
    let limiter = Arc::new(
        MultiWindowLimiter::with_clock(vec![window(25, 1000), window(40, 60_000)], clock.clone())
            .expect("limiter"),
    );

    // The short window caps the first round, the long one what is left after.
    for (round, expected) in [25, 15, 0].into_iter().enumerate() {
        let granted = Arc::new(AtomicU32::new(0));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let granted = Arc::clone(&granted);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        if limiter.try_acquire(1) {
                            granted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker thread");
        }

        assert_eq!(granted.load(Ordering::SeqCst), expected, "round {round}");
        clock.advance_millis(1000);
    }
}

#[tokio::test]
async fn test_raise_returns_immediately_when_saturated() {
    let limiter = MultiWindowLimiter::new(vec![window(1, 60_000)]).expect("limiter");
    let token = CancellationToken::new();

    assert_eq!(limiter.acquire(&token, 1, OverflowBehavior::Raise).await, Ok(true));

    let started = Instant::now();
    let result = limiter.acquire(&token, 1, OverflowBehavior::Raise).await;
    assert!(started.elapsed() < Duration::from_millis(50));
    assert!(matches!(result, Err(LimiterError::Exceeded { capacity: 1, .. })));
}

#[tokio::test]
async fn test_skip_returns_immediately_when_saturated() {
    let limiter = MultiWindowLimiter::new(vec![window(1, 60_000)]).expect("limiter");
    let token = CancellationToken::new();

    assert_eq!(limiter.acquire(&token, 1, OverflowBehavior::Skip).await, Ok(true));

    let started = Instant::now();
    assert_eq!(limiter.acquire(&token, 1, OverflowBehavior::Skip).await, Ok(false));
    assert!(started.elapsed() < Duration::from_millis(50));
}

#[tokio::test]
async fn test_block_waits_for_window_to_roll() {
    let limiter = MultiWindowLimiter::new(vec![window(2, 100)]).expect("limiter");
    let token = CancellationToken::new();

    let started = Instant::now();
    for _ in 0..3 {
        assert_eq!(limiter.acquire(&token, 1, OverflowBehavior::Block).await, Ok(true));
    }

    assert!(started.elapsed() >= Duration::from_millis(95));
}

#[tokio::test]
async fn test_block_cancellation_returns_promptly() {
    let limiter = MultiWindowLimiter::new(vec![window(1, 60_000)]).expect("limiter");
    let token = CancellationToken::new();
    assert!(limiter.try_acquire(1));

    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = limiter.acquire(&token, 1, OverflowBehavior::Block).await;
    let waited = started.elapsed();

    assert_eq!(result, Err(LimiterError::Cancelled));
    assert!(waited >= Duration::from_millis(25));
    assert!(waited < Duration::from_millis(500), "cancellation took {waited:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_blocked_waiters_are_all_eventually_admitted() {
    let limiter = Arc::new(MultiWindowLimiter::new(vec![window(5, 50)]).expect("limiter"));
    let token = CancellationToken::new();

    let started = Instant::now();
    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            let token = token.clone();
            tokio::spawn(async move { limiter.acquire(&token, 1, OverflowBehavior::Block).await })
        })
        .collect();

    for task in tasks {
        let admitted = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("waiter finished")
            .expect("task joined");
        assert_eq!(admitted, Ok(true));
    }

    // 20 grants at 5 per 50ms need at least three full rollovers.
    assert!(started.elapsed() >= Duration::from_millis(140));
}
