//! TTL-validated cache store over a pluggable durable backend
//!
//! The store persists one envelope record per key plus an optional TTL
//! override record (`<key>_expiry`). Reads are self-healing: a record that
//! is stale or fails to decode is deleted as a side effect and reported as
//! absent. No storage failure ever surfaces to readers - the layer degrades
//! to always-fetch behavior when the backend misbehaves.

use std::sync::Arc;
use std::time::Duration;

use fetchcache_common::time::{Clock, SystemClock};
use fetchcache_domain::types::{expiry_key, CacheEnvelope};
use fetchcache_domain::{FetchCacheError, Result};
use serde_json::Value;

use crate::config::CacheConfig;
use crate::ports::StorageBackend;
use crate::stats::{CacheStats, MetricsCollector};

/// Keyed store of `(value, written_at)` envelopes with per-key TTL overrides
///
/// Generic over `Clock` for deterministic expiry testing with `MockClock`.
pub struct CacheStore<C: Clock = SystemClock> {
    backend: Arc<dyn StorageBackend>,
    config: CacheConfig,
    metrics: MetricsCollector,
    clock: C,
}

impl CacheStore<SystemClock> {
    /// Create a store over `backend` using the system clock
    pub fn new(backend: Arc<dyn StorageBackend>, config: CacheConfig) -> Self {
        Self::with_clock(backend, config, SystemClock)
    }
}

impl<C: Clock> CacheStore<C> {
    /// Create a store with a custom clock (for testing)
    pub fn with_clock(backend: Arc<dyn StorageBackend>, config: CacheConfig, clock: C) -> Self {
        Self { backend, config, metrics: MetricsCollector::new(), clock }
    }

    /// Read the value stored under `key`
    ///
    /// Returns `None` when the record is absent, stale, or undecodable.
    /// Stale and undecodable records are deleted as a side effect; backend
    /// read errors are logged and treated as absent.
    pub fn get(&self, key: &str) -> Option<Value> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.record_miss();
                return None;
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "cache read failed; treating as absent");
                self.record_miss();
                return None;
            }
        };

        let envelope: CacheEnvelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "undecodable cache record purged");
                self.purge(key);
                if self.config.track_metrics {
                    self.metrics.record_purge();
                }
                self.record_miss();
                return None;
            }
        };

        let ttl_ms = duration_millis(self.effective_ttl(key));
        let now_ms = self.clock.millis_since_epoch();
        if !envelope.is_fresh(now_ms, ttl_ms) {
            tracing::debug!(
                key = %key,
                age_ms = envelope.age_ms(now_ms),
                ttl_ms,
                "stale cache record purged"
            );
            self.purge(key);
            if self.config.track_metrics {
                self.metrics.record_expiration();
            }
            self.record_miss();
            return None;
        }

        tracing::debug!(key = %key, "cache hit");
        if self.config.track_metrics {
            self.metrics.record_hit();
        }
        Some(envelope.data)
    }

    /// Write `value` under `key`, stamped with the current time
    ///
    /// When `ttl` is supplied the override record is persisted alongside, so
    /// a later read honors it without being told. Write failures are
    /// returned for the caller to log; they never affect the value the
    /// caller hands back to its invoker.
    pub fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let envelope = CacheEnvelope::new(value, self.clock.millis_since_epoch());
        let raw = serde_json::to_string(&envelope)
            .map_err(|err| FetchCacheError::Internal(format!("unserializable cache record: {err}")))?;

        if let Err(err) = self.backend.set(key, &raw) {
            if self.config.track_metrics {
                self.metrics.record_write_failure();
            }
            tracing::warn!(key = %key, error = %err, "cache write failed");
            return Err(err);
        }

        if let Some(ttl) = ttl {
            let ttl_ms = duration_millis(ttl);
            if let Err(err) = self.backend.set(&expiry_key(key), &ttl_ms.to_string()) {
                // Entry already written; the default TTL applies if the
                // override record is lost.
                tracing::warn!(key = %key, error = %err, "ttl override write failed");
            }
        }

        if self.config.track_metrics {
            self.metrics.record_write();
        }
        tracing::debug!(key = %key, "cache record written");
        Ok(())
    }

    /// Resolve the TTL in effect for `key`
    ///
    /// The persisted override record wins; absent or unparseable overrides
    /// fall back to the configured default.
    pub fn effective_ttl(&self, key: &str) -> Duration {
        let default = self.config.default_ttl;
        match self.backend.get(&expiry_key(key)) {
            Ok(Some(raw)) => match raw.trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!(key = %key, raw = %raw, "unparseable ttl override; using default");
                    default
                }
            },
            Ok(None) => default,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "ttl override read failed; using default");
                default
            }
        }
    }

    /// Remove the entry for `key`
    ///
    /// The TTL override record is left in place: it survives entry eviction
    /// and applies to the next write.
    pub fn invalidate(&self, key: &str) {
        self.purge(key);
        tracing::debug!(key = %key, "cache record invalidated");
    }

    /// Remove the TTL override record for `key`
    pub fn clear_expiry(&self, key: &str) {
        if let Err(err) = self.backend.delete(&expiry_key(key)) {
            tracing::warn!(key = %key, error = %err, "ttl override delete failed");
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    fn purge(&self, key: &str) {
        if let Err(err) = self.backend.delete(key) {
            tracing::warn!(key = %key, error = %err, "cache purge failed");
        }
    }

    fn record_miss(&self) {
        if self.config.track_metrics {
            self.metrics.record_miss();
        }
    }
}

impl<C: Clock + Clone> Clone for CacheStore<C> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            clock: self.clock.clone(),
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
