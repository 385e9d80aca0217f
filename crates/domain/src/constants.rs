//! Domain constants
//!
//! Centralized location for the persisted-layout and TTL constants used
//! throughout the cache layer.

use std::time::Duration;

// TTL configuration
pub const DEFAULT_TTL_MS: u64 = 10 * 60 * 1000; // 10 minutes
pub const DEFAULT_TTL: Duration = Duration::from_millis(DEFAULT_TTL_MS);

// Persisted record layout
//
// One durable record per key plus one optional override record:
//   `<key>`          -> JSON `{ "data": <T>, "timestamp": <epoch millis> }`
//   `<key>_expiry`   -> decimal string, milliseconds
pub const EXPIRY_KEY_SUFFIX: &str = "_expiry";

// Key derivation: `<base>` for argument-less calls, `<base>_<canonical>` otherwise
pub const KEY_SEPARATOR: &str = "_";
