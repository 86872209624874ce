//! Tests for the dedup sweeper background task.
//!
//! These tests verify the sweeper lifecycle:
//! - The sweeper evicts expired entries on its own schedule
//! - Young entries survive any number of sweeps
//! - The task exits promptly on the shutdown broadcast
//!
//! # Test Philosophy
//!
//! Time is split in two. Entry age is driven by a `MockClock`, while the sweep
//! cadence runs on real tokio time with a short interval. Assertions use
//! "eventual consistency" patterns rather than fixed sleeps:
//! - Positive cases: Use `poll_until` to verify conditions become true within a timeout
//! - Negative cases: Use `remains_false_for` to verify conditions stay false for a reasonable
//!   period

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{TimeDelta, TimeZone, Utc};
use protect_core::{
    clock::{MockClock, SharedClock},
    config::AppConfig,
    dedup::DedupCache,
    metrics::GatewayMetrics,
    signing::RelaySigner,
};
use server::GatewayServer;
use std::{future::Future, sync::Arc};
use tokio::{
    sync::broadcast,
    time::{sleep, timeout, Duration, Instant},
};

/// Configuration for timing-sensitive test assertions.
struct TestTiming {
    /// Maximum time to wait for a condition to become true.
    poll_timeout: Duration,
    /// Interval between checks when polling.
    poll_interval: Duration,
    /// Duration to verify a condition remains false (for negative tests).
    stability_duration: Duration,
}

impl Default for TestTiming {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(20),
            stability_duration: Duration::from_millis(200),
        }
    }
}

/// Polls until a condition becomes true, or times out.
async fn poll_until<F, Fut>(
    condition_name: &str,
    timing: &TestTiming,
    mut check: F,
) -> Result<Duration, String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    while start.elapsed() < timing.poll_timeout {
        if check().await {
            return Ok(start.elapsed());
        }
        sleep(timing.poll_interval).await;
    }
    Err(format!("{} did not become true within {:?}", condition_name, timing.poll_timeout))
}

/// Verifies a condition remains false for the stability duration.
async fn remains_false_for<F, Fut>(
    condition_name: &str,
    timing: &TestTiming,
    mut check: F,
) -> Result<(), String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    while start.elapsed() < timing.stability_duration {
        if check().await {
            return Err(format!(
                "{} unexpectedly became true after {:?}",
                condition_name,
                start.elapsed()
            ));
        }
        sleep(timing.poll_interval).await;
    }
    Ok(())
}

fn mock_clock() -> Arc<MockClock> {
    Arc::new(MockClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()))
}

fn cache_with(clock: &Arc<MockClock>) -> Arc<DedupCache> {
    let shared: SharedClock = clock.clone();
    Arc::new(DedupCache::with_default_retention(shared))
}

#[tokio::test]
async fn test_sweeper_evicts_expired_entries() {
    let clock = mock_clock();
    let cache = cache_with(&clock);
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let timing = TestTiming::default();

    cache.mark_forwarded("0xabc");
    let handle = cache.start_sweeper(
        Duration::from_millis(25),
        Arc::new(GatewayMetrics::new()),
        shutdown_tx.subscribe(),
    );

    clock.advance(TimeDelta::minutes(21));

    let check = cache.clone();
    poll_until("expired entry swept", &timing, || {
        let cache = check.clone();
        async move { cache.is_empty() }
    })
    .await
    .expect("sweeper should evict the expired entry");

    let _ = shutdown_tx.send(());
    timeout(Duration::from_secs(1), handle).await.expect("sweeper exits").unwrap();
}

#[tokio::test]
async fn test_sweeper_keeps_young_entries() {
    let clock = mock_clock();
    let cache = cache_with(&clock);
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let timing = TestTiming::default();

    cache.mark_forwarded("0xabc");
    clock.advance(TimeDelta::minutes(19));

    let handle = cache.start_sweeper(
        Duration::from_millis(25),
        Arc::new(GatewayMetrics::new()),
        shutdown_tx.subscribe(),
    );

    let check = cache.clone();
    remains_false_for("young entry swept", &timing, || {
        let cache = check.clone();
        async move { !cache.was_forwarded("0xabc") }
    })
    .await
    .expect("entries younger than the window must survive sweeps");

    let _ = shutdown_tx.send(());
    timeout(Duration::from_secs(1), handle).await.expect("sweeper exits").unwrap();
}

#[tokio::test]
async fn test_gateway_sweeper_stops_on_shutdown() {
    let clock = mock_clock();
    let shared: SharedClock = clock.clone();
    let mut config = AppConfig::default();
    config.dedup.sweep_interval_seconds = 1;

    let server = GatewayServer::builder(&config)
        .clock(shared)
        .signer(RelaySigner::random())
        .build()
        .unwrap();
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    server.dedup().mark_forwarded("0xdef");
    let handle = server.start_sweeper(shutdown_tx.subscribe());
    clock.advance(TimeDelta::minutes(30));

    let timing = TestTiming::default();
    let check = Arc::clone(server.dedup());
    poll_until("gateway sweeper ran", &timing, || {
        let cache = check.clone();
        async move { cache.is_empty() }
    })
    .await
    .expect("gateway sweeper should evict within one interval");

    let _ = shutdown_tx.send(());
    timeout(Duration::from_secs(1), handle).await.expect("sweeper exits").unwrap();
}
