use crate::ratelimit::RateLimiter;
use serial_test::serial;
use std::time::{Duration, Instant};

#[tokio::test]
#[serial]
async fn test_consecutive_waits_are_spaced_by_the_delay() {
    let limiter = RateLimiter::local(Duration::from_millis(1000));

    let start = Instant::now();
    limiter.wait("example.com").await;
    limiter.wait("example.com").await;
    let elapsed = start.elapsed();

    // Small epsilon for timer scheduling slack
    assert!(
        elapsed >= Duration::from_millis(990),
        "two waits finished after only {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_first_wait_does_not_sleep() {
    let limiter = RateLimiter::local(Duration::from_millis(500));

    let start = Instant::now();
    limiter.wait("fresh-host.example").await;

    assert!(start.elapsed() < Duration::from_millis(200));
}

#[tokio::test]
async fn test_hosts_are_limited_independently() {
    let limiter = RateLimiter::local(Duration::from_millis(500));

    limiter.wait("a.example").await;

    // A different host is not delayed by a.example's stamp
    let start = Instant::now();
    limiter.wait("b.example").await;
    assert!(start.elapsed() < Duration::from_millis(200));
}

#[tokio::test]
#[serial]
async fn test_set_delay_overrides_the_default() {
    let limiter = RateLimiter::local(Duration::from_secs(5));
    limiter.set_delay("fast.example", 50).await;

    let start = Instant::now();
    limiter.wait("fast.example").await;
    limiter.wait("fast.example").await;
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(45));
    assert!(
        elapsed < Duration::from_secs(2),
        "override ignored; waited {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_zero_delay_never_sleeps() {
    let limiter = RateLimiter::local(Duration::ZERO);

    let start = Instant::now();
    for _ in 0..5 {
        limiter.wait("nolimit.example").await;
    }
    assert!(start.elapsed() < Duration::from_millis(200));
}
