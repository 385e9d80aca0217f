//! Cache configuration types and builder patterns

use std::time::Duration;

use fetchcache_domain::constants::DEFAULT_TTL_MS;

/// Configuration for a cache client
///
/// The default TTL applies to every key without a persisted override.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live applied when a key has no persisted override
    ///
    /// Override via `FETCHCACHE_DEFAULT_TTL_MS` environment variable
    pub default_ttl: Duration,

    /// Whether to collect detailed access metrics
    pub track_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_millis(
                std::env::var("FETCHCACHE_DEFAULT_TTL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_TTL_MS),
            ),
            track_metrics: false,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration builder
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Create config with a fixed default TTL (useful for testing)
    pub fn with_ttl(default_ttl: Duration) -> Self {
        Self { default_ttl, track_metrics: false }
    }

    /// Log configuration at startup
    pub fn log_config(&self) {
        tracing::info!(
            default_ttl_ms = self.default_ttl.as_millis() as u64,
            track_metrics = self.track_metrics,
            "cache configuration loaded"
        );
    }
}

/// Builder for `CacheConfig` with fluent API
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default time-to-live
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = ttl;
        self
    }

    /// Enable or disable metrics tracking
    pub fn track_metrics(mut self, enabled: bool) -> Self {
        self.config.track_metrics = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CacheConfig {
        self.config
    }
}
