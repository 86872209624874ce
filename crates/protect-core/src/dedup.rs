//! Time-windowed record of transactions already forwarded to the relay.
//!
//! The relay penalizes repeated submissions of the same transaction, so the
//! processor consults this cache before every `eth_sendRawTransaction`
//! submission. Entries map a transaction hash to the time it was last
//! forwarded and expire after the retention window (20 minutes by default).
//!
//! # Concurrency
//!
//! Storage is a sharded [`DashMap`]. [`DedupCache::try_mark_forwarded`] performs
//! the check and the insert under a single shard lock via the entry API, so of
//! any number of concurrent callers for the same hash exactly one wins. A
//! separate `was_forwarded` followed by `mark_forwarded` is racy and must not be
//! used to decide whether to submit.
//!
//! # Expiry
//!
//! Lookups treat entries older than the window as absent, so an expired entry is
//! never observable even before it is swept. [`DedupCache::sweep`] reclaims the
//! memory and runs on a fixed interval from [`run_sweeper`].

use crate::{clock::SharedClock, metrics::GatewayMetrics};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, trace};

/// Default retention window for forwarded transactions.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(20 * 60);

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct DedupCache {
    entries: DashMap<String, DateTime<Utc>>,
    retention: TimeDelta,
    clock: SharedClock,
}

impl std::fmt::Debug for DedupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupCache")
            .field("entries", &self.entries.len())
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

impl DedupCache {
    #[must_use]
    pub fn new(retention: Duration, clock: SharedClock) -> Self {
        Self {
            entries: DashMap::new(),
            retention: TimeDelta::from_std(retention).unwrap_or(TimeDelta::MAX),
            clock,
        }
    }

    #[must_use]
    pub fn with_default_retention(clock: SharedClock) -> Self {
        Self::new(DEFAULT_RETENTION, clock)
    }

    #[inline]
    fn is_expired(&self, forwarded_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(forwarded_at) > self.retention
    }

    /// Returns true iff an unexpired entry exists for `tx_hash`.
    #[must_use]
    pub fn was_forwarded(&self, tx_hash: &str) -> bool {
        let now = self.clock.now();
        self.entries.get(tx_hash).is_some_and(|entry| !self.is_expired(*entry, now))
    }

    /// Inserts or refreshes the entry for `tx_hash` with the current time.
    pub fn mark_forwarded(&self, tx_hash: &str) {
        let now = self.clock.now();
        self.entries.insert(tx_hash.to_string(), now);
        trace!(tx_hash, "marked forwarded");
    }

    /// Atomically claims `tx_hash` for forwarding.
    ///
    /// Returns `true` if no unexpired entry existed and this call recorded one;
    /// the caller is then the only one allowed to submit. Returns `false` if the
    /// transaction was already forwarded inside the retention window.
    #[must_use]
    pub fn try_mark_forwarded(&self, tx_hash: &str) -> bool {
        let now = self.clock.now();

        match self.entries.entry(tx_hash.to_string()) {
            Entry::Occupied(mut occupied) => {
                if self.is_expired(*occupied.get(), now) {
                    occupied.insert(now);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now);
                true
            }
        }
    }

    /// Drops the entry for `tx_hash`, if any.
    ///
    /// Used when a claimed submission never reached the relay.
    pub fn forget(&self, tx_hash: &str) -> bool {
        self.entries.remove(tx_hash).is_some()
    }

    /// Removes every entry older than the retention window.
    ///
    /// Returns the number of entries evicted. Entries inserted while the sweep
    /// is running carry a timestamp no older than the sweep's `now` and are kept.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();

        self.entries.retain(|_, forwarded_at| !self.is_expired(*forwarded_at, now));

        before.saturating_sub(self.entries.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn retention(&self) -> TimeDelta {
        self.retention
    }

    /// Spawns [`run_sweeper`] for this cache.
    pub fn start_sweeper(
        self: &Arc<Self>,
        sweep_interval: Duration,
        metrics: Arc<GatewayMetrics>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(run_sweeper(Arc::clone(self), sweep_interval, metrics, shutdown_rx))
    }
}

/// Periodically sweeps expired entries until shutdown is signalled.
///
/// An entry stays in memory at most `retention + sweep_interval` after its last
/// forward.
pub async fn run_sweeper(
    cache: Arc<DedupCache>,
    sweep_interval: Duration,
    metrics: Arc<GatewayMetrics>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = interval(sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing can be stale yet.
    ticker.tick().await;

    info!(interval_secs = sweep_interval.as_secs(), "dedup sweeper started");

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.recv() => {
                debug!("dedup sweeper received shutdown signal");
                break;
            }

            _ = ticker.tick() => {
                let evicted = cache.sweep();
                let remaining = cache.len();
                metrics.record_sweep(evicted, remaining);

                if evicted > 0 {
                    debug!(evicted, remaining, "swept expired dedup entries");
                }
            }
        }
    }

    info!("dedup sweeper shutdown complete");
}
