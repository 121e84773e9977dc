//! Cache statistics tracking and reporting.
//!
//! Counters are atomics so the synchronous lookup path and the background
//! tasks can record events without sharing a lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Live cache counters, shared between the facade and its background tasks.
#[derive(Debug)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    fills_started: AtomicU64,
    fills_coalesced: AtomicU64,
    fills_succeeded: AtomicU64,
    fills_failed: AtomicU64,
    bytes_written: AtomicU64,
    reconciles: AtomicU64,
    entries_evicted: AtomicU64,
    created_at: Instant,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStats {
    /// Create a new statistics tracker.
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            fills_started: AtomicU64::new(0),
            fills_coalesced: AtomicU64::new(0),
            fills_succeeded: AtomicU64::new(0),
            fills_failed: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            reconciles: AtomicU64::new(0),
            entries_evicted: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    /// Record a lookup that found a stored entry.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup that fell back to the remote identifier.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a background fill being spawned.
    pub fn record_fill_started(&self) {
        self.fills_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a miss that joined a fill already in flight.
    pub fn record_fill_coalesced(&self) {
        self.fills_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fill that published an entry.
    pub fn record_fill_succeeded(&self, bytes: u64) {
        self.fills_succeeded.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a fill that ended without an entry.
    pub fn record_fill_failed(&self) {
        self.fills_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed reconciliation pass.
    pub fn record_reconcile(&self, evicted: u64) {
        self.reconciles.fetch_add(1, Ordering::Relaxed);
        self.entries_evicted.fetch_add(evicted, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> CacheStatistics {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        CacheStatistics {
            hits,
            misses,
            fills_started: self.fills_started.load(Ordering::Relaxed),
            fills_coalesced: self.fills_coalesced.load(Ordering::Relaxed),
            fills_succeeded: self.fills_succeeded.load(Ordering::Relaxed),
            fills_failed: self.fills_failed.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            reconciles: self.reconciles.load(Ordering::Relaxed),
            entries_evicted: self.entries_evicted.load(Ordering::Relaxed),
            hit_rate_percent: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64 * 100.0
            },
            uptime_secs: self.created_at.elapsed().as_secs(),
        }
    }
}

/// Snapshot of cache statistics for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub fills_started: u64,
    pub fills_coalesced: u64,
    pub fills_succeeded: u64,
    pub fills_failed: u64,
    pub bytes_written: u64,
    pub reconciles: u64,
    pub entries_evicted: u64,
    pub hit_rate_percent: f64,
    pub uptime_secs: u64,
}

impl CacheStatistics {
    /// Format statistics as a human-readable string.
    pub fn format(&self) -> String {
        format!(
            r#"Image Cache Statistics

LOOKUPS
  Hits:        {}
  Misses:      {}
  Hit Rate:    {:.1}%

FILLS
  Started:     {}
  Coalesced:   {}
  Succeeded:   {}
  Failed:      {}
  Bytes:       {:.2} MB

RECONCILIATION
  Passes:      {}
  Evicted:     {}

Uptime:        {}s
"#,
            self.hits,
            self.misses,
            self.hit_rate_percent,
            self.fills_started,
            self.fills_coalesced,
            self.fills_succeeded,
            self.fills_failed,
            self.bytes_written as f64 / (1024.0 * 1024.0),
            self.reconciles,
            self.entries_evicted,
            self.uptime_secs,
        )
    }
}
