//! TTL price cache
//!
//! The oracle is pure and recomputes on every call; this cache amortizes
//! repeated lookups. Uses DashMap for concurrent reads/writes.
//!
//! Entries are tagged with the pair snapshot generation they were computed
//! from; a lookup for another generation is a miss.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Timestamped price entry
#[derive(Debug, Clone)]
pub struct PriceEntry {
    pub price: Option<f64>,
    pub generation: u64,
    pub updated_at: Instant,
}

impl PriceEntry {
    pub fn age(&self) -> Duration {
        self.updated_at.elapsed()
    }

    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.age() > max_age
    }
}

/// Prices keyed by token canister id
#[derive(Debug)]
pub struct PriceCache {
    entries: DashMap<String, PriceEntry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `token` computed from snapshot `generation`, if any.
    ///
    /// The outer `Option` is presence, the inner one is the cached
    /// "could not price" result.
    pub fn get(&self, token: &str, generation: u64) -> Option<Option<f64>> {
        let hit = self
            .entries
            .get(token)
            .filter(|entry| entry.generation == generation && !entry.is_stale(self.ttl))
            .map(|entry| entry.price);

        match hit {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        hit
    }

    /// Store a price; never replaces an entry from a newer generation
    pub fn insert(&self, token: &str, generation: u64, price: Option<f64>) {
        let entry = PriceEntry {
            price,
            generation,
            updated_at: Instant::now(),
        };
        match self.entries.entry(token.to_string()) {
            Entry::Occupied(mut slot) => {
                if slot.get().generation <= generation {
                    slot.insert(entry);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
    }

    pub fn get_or_insert_with<F>(&self, token: &str, generation: u64, compute: F) -> Option<f64>
    where
        F: FnOnce() -> Option<f64>,
    {
        if let Some(price) = self.get(token, generation) {
            return price;
        }
        let price = compute();
        self.insert(token, generation, price);
        price
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop stale entries
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, v| !v.is_stale(ttl));
    }

    pub fn stats(&self) -> PriceCacheStats {
        PriceCacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Statistics about the price cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}
