//! # Fetchcache Core
//!
//! Request-deduplicating TTL cache logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (`StorageBackend`, `FetchSource`)
//! - The TTL-validated cache store with purge-on-read self-healing
//! - The in-flight registry that coalesces concurrent fetches per key
//! - The cached-call service binding both around a fetch source
//! - Key canonicalization, configuration, and statistics
//!
//! ## Architecture Principles
//! - Only depends on `fetchcache-common` and `fetchcache-domain`
//! - No database or transport code; the durable medium arrives via traits
//! - The cache is an optimization, never a dependency for correctness:
//!   every storage failure degrades to always-fetch behavior

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod config;
pub mod flight;
pub mod key;
pub mod ports;
pub mod service;
pub mod stats;
pub mod store;

// Re-export specific items to avoid ambiguity
pub use config::{CacheConfig, CacheConfigBuilder};
pub use flight::{FlightRegistry, FlightStats, SharedComputation};
pub use key::{canonical_json, derive_key, CanonicalArgs};
pub use ports::{FetchSource, FnSource, StorageBackend};
pub use service::{CacheClient, CachedCall, CallConfig};
pub use stats::CacheStats;
pub use store::CacheStore;
