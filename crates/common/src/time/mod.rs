//! Time abstraction for testability
//!
//! Cache freshness is a pure function of `(written_at, ttl)`, which makes
//! every interesting behavior in this workspace time-dependent. This module
//! provides a trait-based approach to time operations so that expiry logic
//! can be tested deterministically without real time passing.

mod clock;

pub use clock::{Clock, MockClock, SystemClock};
