//! Persisted cache record types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::EXPIRY_KEY_SUFFIX;

/// Durable record stored under a cache key
///
/// Serialized layout is `{ "data": <payload>, "timestamp": <epoch millis> }`.
/// The payload is kept as raw JSON: the store never needs to understand it,
/// only the wrapped call site does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEnvelope {
    /// Cached payload, opaque to the store
    pub data: Value,
    /// Write time, milliseconds since UNIX epoch
    pub timestamp: u64,
}

impl CacheEnvelope {
    /// Create an envelope stamped with the given write time
    pub fn new(data: Value, timestamp: u64) -> Self {
        Self { data, timestamp }
    }

    /// Age of the record at `now_ms`, saturating at zero for clock skew
    #[must_use]
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }

    /// Freshness is a pure function of `(timestamp, ttl)`: fresh iff
    /// `now - timestamp < ttl`, stale at exactly `ttl`.
    #[must_use]
    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.age_ms(now_ms) < ttl_ms
    }
}

/// Key of the optional TTL override record for `key`
///
/// Stored independently of the envelope so it can be set before the entry
/// exists and survives entry eviction.
#[must_use]
pub fn expiry_key(key: &str) -> String {
    format!("{key}{EXPIRY_KEY_SUFFIX}")
}
