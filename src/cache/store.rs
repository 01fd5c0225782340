//! In-memory store for cached API responses

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;

use super::CacheKey;

/// A cached response body and when it was fetched
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The decoded response body
    pub value: Arc<Value>,
    /// When the body was last fetched successfully
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Wraps a response body fetched at `stored_at`
    pub fn new(value: impl Into<Arc<Value>>, stored_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            stored_at,
        }
    }
}

/// Process-lifetime map from cache key to entry
///
/// Unbounded and never evicted. Each key holds at most one entry; inserting
/// replaces whatever was there.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl CacheStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the entry for `key`, if any
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.read().get(key).cloned()
    }

    /// Stores `entry` under `key`, replacing any previous entry
    pub fn insert(&self, key: CacheKey, entry: CacheEntry) {
        self.entries.write().insert(key, entry);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of cached requests
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
