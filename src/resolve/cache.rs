//! Search-result cache.
//!
//! Bounded LRU with TTL expiry, keyed by normalized search term. The map is
//! a concurrent `DashMap` so in-flight resolutions read and write without a
//! global lock. Contract: concurrent writes to the same key are
//! last-writer-wins, which is safe because a cached value is an idempotent
//! recomputation of the same query.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::SearchOutcome;

pub const DEFAULT_CAPACITY: usize = 1000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    outcome: SearchOutcome,
    inserted_at: Instant,
    last_used: u64,
}

/// Bounded, time-expiring store of normalized search term → outcome.
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
    capacity: usize,
    ttl: Duration,
    clock: AtomicU64,
}

impl ResultCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        ResultCache {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            ttl,
            clock: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// Fetch a live entry, bumping its recency. Expired entries are removed
    /// and reported as absent.
    pub fn get(&self, key: &str) -> Option<SearchOutcome> {
        {
            let mut entry = self.entries.get_mut(key)?;
            if entry.inserted_at.elapsed() <= self.ttl {
                entry.last_used = self.tick();
                return Some(entry.outcome.clone());
            }
        }
        self.entries.remove(key);
        None
    }

    /// Insert or refresh an entry, evicting the least-recently-used entry
    /// first when at capacity.
    pub fn insert(&self, key: &str, outcome: SearchOutcome) {
        if !self.entries.contains_key(key) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        let stamp = self.tick();
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                outcome,
                inserted_at: Instant::now(),
                last_used: stamp,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn evict_lru(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().last_used)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}
