//! Cache statistics and metrics tracking
//!
//! Counters are collected with atomics so monitoring never contends with
//! the hot path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from a fresh record
    pub hits: u64,

    /// Reads that found nothing usable (absent, stale, or undecodable)
    pub misses: u64,

    /// Records written successfully
    pub writes: u64,

    /// Writes the backend rejected (quota, I/O); never fatal to callers
    pub write_failures: u64,

    /// Records purged because they were stale on read
    pub expirations: u64,

    /// Records purged because they failed to decode (self-healing)
    pub purges: u64,
}

impl CacheStats {
    /// Calculate hit rate (hits / total accesses)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate miss rate (misses / total accesses)
    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }

    /// Total number of read operations (hits + misses)
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Thread-safe metrics collector for cache operations
///
/// Uses atomic operations to track cache metrics without requiring locks,
/// enabling low-overhead monitoring.
#[derive(Debug)]
pub(crate) struct MetricsCollector {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    writes: Arc<AtomicU64>,
    write_failures: Arc<AtomicU64>,
    expirations: Arc<AtomicU64>,
    purges: Arc<AtomicU64>,
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            hits: Arc::clone(&self.hits),
            misses: Arc::clone(&self.misses),
            writes: Arc::clone(&self.writes),
            write_failures: Arc::clone(&self.write_failures),
            expirations: Arc::clone(&self.expirations),
            purges: Arc::clone(&self.purges),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub(crate) fn new() -> Self {
        Self {
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            writes: Arc::new(AtomicU64::new(0)),
            write_failures: Arc::new(AtomicU64::new(0)),
            expirations: Arc::new(AtomicU64::new(0)),
            purges: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record a cache hit
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss
    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful write
    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected write
    pub(crate) fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a stale record purged on read
    pub(crate) fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an undecodable record purged on read
    pub(crate) fn record_purge(&self) {
        self.purges.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics snapshot
    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            purges: self.purges.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for stats.
    use super::*;

    /// Validates `CacheStats::default` behavior for the stats default
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms every counter starts at zero.
    /// - Confirms `stats.hit_rate()` equals `0.0`.
    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.writes, 0);
        assert_eq!(stats.write_failures, 0);
        assert_eq!(stats.expirations, 0);
        assert_eq!(stats.purges, 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    /// Validates `CacheStats::hit_rate` behavior for the rate calculation
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures `(stats.hit_rate() - 0.8).abs() < 1e-10` evaluates to true.
    /// - Ensures `(stats.miss_rate() - 0.2).abs() < 1e-10` evaluates to true.
    /// - Confirms `stats.total_accesses()` equals `100`.
    #[test]
    fn test_hit_rate_calculation() {
        let stats = CacheStats { hits: 80, misses: 20, ..Default::default() };

        assert!((stats.hit_rate() - 0.8).abs() < 1e-10);
        assert!((stats.miss_rate() - 0.2).abs() < 1e-10);
        assert_eq!(stats.total_accesses(), 100);
    }

    /// Validates `MetricsCollector::new` behavior for the record operations
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms each counter reflects exactly one recorded event.
    #[test]
    fn test_metrics_collector_record_operations() {
        let collector = MetricsCollector::new();

        collector.record_hit();
        collector.record_miss();
        collector.record_write();
        collector.record_write_failure();
        collector.record_expiration();
        collector.record_purge();

        let stats = collector.snapshot();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.write_failures, 1);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.purges, 1);
    }

    /// Validates `MetricsCollector::clone` behavior for the shared counters
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `stats1.hits` equals `2`.
    /// - Confirms `stats2.hits` equals `2`.
    #[test]
    fn test_metrics_collector_clone() {
        let collector1 = MetricsCollector::new();
        collector1.record_hit();

        let collector2 = collector1.clone();
        collector2.record_hit();

        // Both should see the same counts (shared Arc)
        assert_eq!(collector1.snapshot().hits, 2);
        assert_eq!(collector2.snapshot().hits, 2);
    }

    /// Validates `MetricsCollector::new` behavior for the thread safety
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `stats.hits` equals `1000`.
    #[test]
    fn test_metrics_collector_thread_safety() {
        use std::thread;

        let collector = Arc::new(MetricsCollector::new());
        let mut handles = vec![];

        // Spawn 10 threads, each recording 100 hits
        for _ in 0..10 {
            let collector_clone = Arc::clone(&collector);
            let handle = thread::spawn(move || {
                for _ in 0..100 {
                    collector_clone.record_hit();
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(collector.snapshot().hits, 1000);
    }
}
