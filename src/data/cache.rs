//! Caller-owned memoization of loaded datasets.
//!
//! Entries are keyed by source identity (id + URL) and expire after a fixed
//! window measured from when they were stored. With no TTL an entry lives as
//! long as the cache does.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::data::loader::Loaded;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    id: String,
    url: String,
}

impl SourceKey {
    pub fn new(id: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            url: url.to_string(),
        }
    }
}

#[derive(Debug)]
struct Entry<D> {
    stored_at: Instant,
    value: Loaded<D>,
}

#[derive(Debug)]
pub struct DatasetCache<D> {
    ttl: Option<Duration>,
    entries: HashMap<SourceKey, Entry<D>>,
}

impl<D> DatasetCache<D> {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Entries never expire.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Live entry for `key` as of `now`.
    pub fn get(&self, key: &SourceKey, now: Instant) -> Option<&Loaded<D>> {
        self.entries
            .get(key)
            .filter(|entry| is_live(self.ttl, entry.stored_at, now))
            .map(|entry| &entry.value)
    }

    pub fn insert(&mut self, key: SourceKey, value: Loaded<D>, now: Instant) {
        self.entries.insert(key, Entry { stored_at: now, value });
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| is_live(ttl, entry.stored_at, now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_live(ttl: Option<Duration>, stored_at: Instant, now: Instant) -> bool {
    match ttl {
        None => true,
        Some(ttl) => now.saturating_duration_since(stored_at) < ttl,
    }
}

impl<D> Default for DatasetCache<D> {
    fn default() -> Self {
        Self::unbounded()
    }
}
