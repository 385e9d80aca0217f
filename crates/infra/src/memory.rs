//! In-memory storage backend
//!
//! Keyed string storage behind a `parking_lot::RwLock`. An optional entry
//! cap models bounded media: once full, writes to new keys are rejected and
//! surface to the store as non-fatal write failures, while overwrites of
//! existing keys still succeed.

use std::collections::HashMap;

use fetchcache_core::StorageBackend;
use fetchcache_domain::{FetchCacheError, Result};
use parking_lot::RwLock;

/// In-process backend, primarily for tests and single-run tools
pub struct MemoryBackend {
    records: RwLock<HashMap<String, String>>,
    max_entries: Option<usize>,
}

impl MemoryBackend {
    /// Create an unbounded backend
    pub fn new() -> Self {
        Self { records: RwLock::new(HashMap::new()), max_entries: None }
    }

    /// Create a backend that rejects writes to new keys once `max_entries`
    /// records exist
    pub fn bounded(max_entries: usize) -> Self {
        Self { records: RwLock::new(HashMap::new()), max_entries: Some(max_entries) }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the backend holds no records
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut records = self.records.write();
        if let Some(max) = self.max_entries {
            if records.len() >= max && !records.contains_key(key) {
                return Err(FetchCacheError::Storage(format!(
                    "capacity exhausted: {max} entries"
                )));
            }
        }
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.records.write().remove(key);
        Ok(())
    }
}
