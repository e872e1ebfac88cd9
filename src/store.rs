//! Store
//!
//! The single in-memory key → value mapping behind both listeners.
//!
//! ## Concurrency
//! The map sits behind a `RwLock`, so every `get`/`put` is atomic with respect
//! to every other one no matter how many requests are in flight. Each listener
//! thread only ever has one request outstanding, but nothing here depends on
//! that.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::KeyNotFound;

/// In-memory string → string mapping with last-write-wins semantics
#[derive(Debug, Default)]
pub struct Store {
    entries: RwLock<HashMap<String, String>>,
}

impl Store {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`. Never fails.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(key.into(), value.into());
    }

    /// Current value for `key`
    pub fn get(&self, key: &str) -> Result<String, KeyNotFound> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(KeyNotFound::default)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
