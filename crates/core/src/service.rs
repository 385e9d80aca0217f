//! Cached-call service
//!
//! `CacheClient` binds one `CacheStore` and one `FlightRegistry` together
//! and wraps fetch sources into callables with identical success/error
//! semantics plus caching and coalescing. Per invocation: derive the key,
//! join an outstanding fetch if one exists, otherwise serve from cache,
//! otherwise start the fetch through the registry; a successful settlement
//! is written through to the store exactly once, inside the single flight.

use std::sync::Arc;
use std::time::Duration;

use fetchcache_common::time::{Clock, SystemClock};
use fetchcache_domain::{FetchCacheError, Result};
use futures::FutureExt;
use serde_json::Value;

use crate::config::CacheConfig;
use crate::flight::{FlightRegistry, FlightStats};
use crate::key::derive_key;
use crate::ports::{FetchSource, StorageBackend};
use crate::stats::CacheStats;
use crate::store::CacheStore;

/// Per-callable configuration: base key and time-to-live
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// Stable identifier prefixed to every derived key
    pub base_key: String,
    /// TTL written with each successful fetch for this callable
    pub ttl: Duration,
}

impl CallConfig {
    /// Create a call configuration
    pub fn new(base_key: impl Into<String>, ttl: Duration) -> Self {
        Self { base_key: base_key.into(), ttl }
    }
}

/// Client owning the store and the in-flight registry
///
/// Construct one per durable medium and wrap any number of fetch sources
/// with it; all wrapped callables share the same registry, so their flights
/// and records live in one place with a clear lifecycle.
pub struct CacheClient<C: Clock = SystemClock> {
    store: CacheStore<C>,
    flights: Arc<FlightRegistry>,
}

impl CacheClient<SystemClock> {
    /// Create a client over `backend` using the system clock
    pub fn new(backend: Arc<dyn StorageBackend>, config: CacheConfig) -> Self {
        Self::with_clock(backend, config, SystemClock)
    }
}

impl<C: Clock + Clone> CacheClient<C> {
    /// Create a client with a custom clock (for testing)
    pub fn with_clock(backend: Arc<dyn StorageBackend>, config: CacheConfig, clock: C) -> Self {
        config.log_config();
        Self {
            store: CacheStore::with_clock(backend, config, clock),
            flights: Arc::new(FlightRegistry::new()),
        }
    }

    /// Wrap a fetch source into a cached callable
    pub fn wrap<S: FetchSource>(&self, source: S, config: CallConfig) -> CachedCall<S, C> {
        CachedCall {
            source: Arc::new(source),
            config,
            store: self.store.clone(),
            flights: Arc::clone(&self.flights),
        }
    }

    /// Access the underlying store (invalidation, TTL inspection)
    pub fn store(&self) -> &CacheStore<C> {
        &self.store
    }

    /// Get store statistics
    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    /// Get in-flight registry statistics
    pub fn flight_stats(&self) -> FlightStats {
        self.flights.stats()
    }
}

/// A wrapped fetch source with caching and request coalescing
///
/// Cheap to clone; clones share the client's store and registry.
pub struct CachedCall<S: FetchSource, C: Clock = SystemClock> {
    source: Arc<S>,
    config: CallConfig,
    store: CacheStore<C>,
    flights: Arc<FlightRegistry>,
}

impl<S, C> CachedCall<S, C>
where
    S: FetchSource + 'static,
    S::Args: 'static,
    C: Clock + Clone + 'static,
{
    /// Invoke the wrapped source with caching and coalescing
    ///
    /// Success and error semantics are identical to the source's own:
    /// a fetch failure is propagated unchanged and leaves no record behind,
    /// so the next call for the same key starts a brand-new fetch.
    pub async fn call(&self, args: S::Args) -> Result<S::Output> {
        let key = derive_key(&self.config.base_key, &args)?;

        // Join an outstanding fetch before consulting the store, so every
        // concurrent caller observes the same settlement.
        if let Some(pending) = self.flights.join(&key) {
            let value = pending.await?;
            return decode_fetched(&key, value);
        }

        if let Some(value) = self.store.get(&key) {
            match serde_json::from_value::<S::Output>(value) {
                Ok(decoded) => {
                    tracing::debug!(key = %key, "serving cached value");
                    return Ok(decoded);
                }
                Err(err) => {
                    // Payload no longer matches the call site's type (e.g. a
                    // schema change); treat like any undecodable record.
                    tracing::warn!(key = %key, error = %err, "cached payload failed to decode; purging");
                    self.store.invalidate(&key);
                }
            }
        }

        let computation = {
            let source = Arc::clone(&self.source);
            let store = self.store.clone();
            let ttl = self.config.ttl;
            let fetch_key = key.clone();
            self.flights.join_or_start(&key, move || {
                async move {
                    let fetched = source.fetch(args).await?;
                    let value = serde_json::to_value(&fetched).map_err(|err| {
                        FetchCacheError::Internal(format!("unserializable fetch result: {err}"))
                    })?;
                    if let Err(err) = store.set(&fetch_key, value.clone(), Some(ttl)) {
                        tracing::warn!(
                            key = %fetch_key,
                            error = %err,
                            "cache not updated; returning fetched value"
                        );
                    }
                    Ok(value)
                }
                .boxed()
            })
        };

        let value = computation.await?;
        decode_fetched(&key, value)
    }

    /// Fetch unconditionally and refresh the cached record
    ///
    /// Returns the fetched value for optional use by the caller; a failed
    /// fetch is logged and reported as `None`, never as an error. The
    /// existing record keeps serving readers until the refresh lands.
    pub async fn refresh(&self, args: S::Args) -> Option<S::Output> {
        let key = match derive_key(&self.config.base_key, &args) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(base_key = %self.config.base_key, error = %err, "refresh skipped");
                return None;
            }
        };

        match self.source.fetch(args).await {
            Ok(fetched) => {
                match serde_json::to_value(&fetched) {
                    Ok(value) => {
                        if let Err(err) = self.store.set(&key, value, None) {
                            tracing::warn!(key = %key, error = %err, "refresh write failed");
                        }
                    }
                    Err(err) => {
                        tracing::warn!(key = %key, error = %err, "unserializable refresh result");
                    }
                }
                Some(fetched)
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "background refresh failed");
                None
            }
        }
    }

    /// Drop the cached record for these arguments
    ///
    /// The next call re-fetches; an in-flight computation is unaffected.
    pub fn invalidate(&self, args: &S::Args) -> Result<()> {
        let key = derive_key(&self.config.base_key, args)?;
        self.store.invalidate(&key);
        Ok(())
    }

    /// The cache key this callable derives for `args`
    pub fn key_for(&self, args: &S::Args) -> Result<String> {
        derive_key(&self.config.base_key, args)
    }
}

impl<S: FetchSource, C: Clock + Clone> Clone for CachedCall<S, C> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            config: self.config.clone(),
            store: self.store.clone(),
            flights: Arc::clone(&self.flights),
        }
    }
}

fn decode_fetched<T: serde::de::DeserializeOwned>(key: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|err| {
        FetchCacheError::Internal(format!("fetched payload for `{key}` failed to decode: {err}"))
    })
}
