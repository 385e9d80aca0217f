//! Error types used throughout the cache layer

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for fetchcache
///
/// Variants are `Clone` because a coalesced fetch delivers its terminal
/// error to every joined caller, not just the caller that started it.
///
/// Only `Upstream` ever escapes a cached call: storage and decode failures
/// degrade the layer to always-fetch behavior instead of surfacing.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum FetchCacheError {
    /// Durable backend failure (read, write, or delete)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Persisted record failed to decode; purged on read, never surfaced
    #[error("Corrupt cache record: {0}")]
    Corrupt(String),

    /// The wrapped fetch function failed; propagated to callers unchanged
    #[error("Upstream fetch error: {0}")]
    Upstream(String),

    /// Arguments could not be canonicalized into a cache key
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected failure inside the layer (value serialization, registry)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for fetchcache operations
pub type Result<T> = std::result::Result<T, FetchCacheError>;
