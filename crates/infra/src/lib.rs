//! # Fetchcache Infra
//!
//! Storage backends implementing the core `StorageBackend` port.
//!
//! This crate contains:
//! - `MemoryBackend`: capacity-bounded in-process storage
//! - `SqliteBackend`: durable single-file storage over rusqlite
//!
//! Both present the same synchronous string-payload surface, so the core
//! pipeline is indifferent to the durable medium behind it.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod memory;
pub mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
