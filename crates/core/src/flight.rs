//! In-flight fetch registry (request coalescing)
//!
//! At most one outstanding computation exists per cache key: the first
//! caller starts the fetch, every concurrent caller for the same key joins
//! the same shared future and observes the identical settlement - value or
//! error. The registry entry is removed when the computation settles and
//! before the result reaches any joiner, so a call racing with settlement
//! either joins the settling computation or correctly starts a fresh one.
//!
//! Abandoned joiners do not cancel a flight: the computation runs on a
//! spawned task until it settles, since other joiners may depend on it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fetchcache_domain::{FetchCacheError, Result};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;

/// Handle to an in-progress computation; cloned to every joiner
pub type SharedComputation = Shared<BoxFuture<'static, Result<Value>>>;

type PendingMap = HashMap<String, SharedComputation>;

/// Registry of in-flight computations keyed by request identity
///
/// Constructed once per cache client and shared by reference with every
/// wrapped callable. The check-and-register step runs under one mutex
/// acquisition, so no two calls issued without an intervening settlement
/// can both start a fetch for the same key.
pub struct FlightRegistry {
    pending: Arc<Mutex<PendingMap>>,
    started: AtomicU64,
    joined: AtomicU64,
}

/// Snapshot of registry activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightStats {
    /// Computations started (one per physical fetch)
    pub started: u64,
    /// Callers that joined an already-outstanding computation
    pub joined: u64,
    /// Computations currently in flight
    pub pending: usize,
}

impl FlightRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            started: AtomicU64::new(0),
            joined: AtomicU64::new(0),
        }
    }

    /// Join the outstanding computation for `key`, if one exists
    pub fn join(&self, key: &str) -> Option<SharedComputation> {
        let pending = self.pending.lock();
        let computation = pending.get(key).cloned();
        if computation.is_some() {
            self.joined.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "joining in-flight fetch");
        }
        computation
    }

    /// Join the outstanding computation for `key`, or start a new one
    ///
    /// `start` is only invoked when no computation is outstanding; it runs
    /// while the registry lock is held, so it must only construct the future
    /// (the fetch itself begins on a spawned task). Must be called from
    /// within a tokio runtime.
    pub fn join_or_start<F>(&self, key: &str, start: F) -> SharedComputation
    where
        F: FnOnce() -> BoxFuture<'static, Result<Value>>,
    {
        let mut pending = self.pending.lock();

        if let Some(existing) = pending.get(key) {
            self.joined.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "joining in-flight fetch");
            return existing.clone();
        }

        self.started.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, "starting fetch");

        // The task removes its own entry after the inner computation
        // settles, so deregistration happens before any joiner can observe
        // the result. The map lock is held until the new entry is inserted,
        // which keeps an instantly-settling task from removing it first.
        let registry = Arc::clone(&self.pending);
        let owned_key = key.to_string();
        let inner = start();
        let task = tokio::spawn(async move {
            let result = inner.await;
            registry.lock().remove(&owned_key);
            result
        });

        let registry = Arc::clone(&self.pending);
        let owned_key = key.to_string();
        let computation: SharedComputation = async move {
            match task.await {
                Ok(result) => result,
                Err(err) => {
                    // Task aborted or panicked: drop the dead entry so the
                    // next caller starts over.
                    registry.lock().remove(&owned_key);
                    Err(FetchCacheError::Internal(format!("fetch task failed: {err}")))
                }
            }
        }
        .boxed()
        .shared();

        pending.insert(key.to_string(), computation.clone());
        computation
    }

    /// Number of computations currently in flight
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether a computation is outstanding for `key`
    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.lock().contains_key(key)
    }

    /// Get registry statistics
    pub fn stats(&self) -> FlightStats {
        FlightStats {
            started: self.started.load(Ordering::Relaxed),
            joined: self.joined.load(Ordering::Relaxed),
            pending: self.pending_count(),
        }
    }
}

impl Default for FlightRegistry {
    fn default() -> Self {
        Self::new()
    }
}
