//! Time-to-live cache for fetched reports.
//!
//! Callers pass the current time in, so expiry is fully under their control.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

struct CacheEntry<V> {
    stored_at: DateTime<Utc>,
    value: V,
}

/// Keyed cache whose entries expire `ttl` after insertion.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: HashMap<String, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    /// A zero or negative `ttl` disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn from_std(ttl: std::time::Duration) -> Self {
        Self::new(Duration::from_std(ttl).unwrap_or(Duration::MAX))
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl > Duration::zero()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.stored_at) < self.ttl
    }

    /// Cached value for `key`, unless it has expired.
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V, now: DateTime<Utc>) {
        if !self.is_enabled() {
            return;
        }
        self.prune(now);
        self.entries.insert(
            key.into(),
            CacheEntry {
                stored_at: now,
                value,
            },
        );
    }

    /// Drop expired entries, returning how many were removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.signed_duration_since(entry.stored_at) < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
