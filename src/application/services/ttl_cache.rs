//! # TTL Cache
//!
//! Bounded, expire-after-write in-memory cache with hit/miss statistics.
//!
//! Entries expire `ttl` after they were written. When the cache is full the
//! oldest entry is evicted. Reads and writes take a short synchronous lock and
//! never suspend, so a reader never observes a half-written entry.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    written_at: Instant,
}

/// Point-in-time copy of cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that found a live entry.
    pub hits: u64,
    /// Reads that found nothing or an expired entry.
    pub misses: u64,
    /// Entries removed by expiry, capacity or invalidation.
    pub evictions: u64,
    /// Completed population attempts recorded by the owner.
    pub loads: u64,
}

impl CacheStats {
    /// Fraction of reads that were hits, if any read happened.
    #[must_use]
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        (total > 0).then(|| self.hits as f64 / total as f64)
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    loads: AtomicU64,
}

/// Bounded expire-after-write cache.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    capacity: usize,
    counters: Counters,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
            counters: Counters::default(),
        }
    }

    /// Returns the time-to-live.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a live value, dropping it if it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if now.duration_since(entry.written_at) < self.ttl => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a value, replacing any previous one and resetting its TTL.
    pub fn insert(&self, key: K, value: V) {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.written_at) < self.ttl);
        let mut evicted = (before - entries.len()) as u64;

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.written_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                evicted += 1;
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                written_at: now,
            },
        );
        if evicted > 0 {
            self.counters.evictions.fetch_add(evicted, Ordering::Relaxed);
        }
    }

    /// Removes an entry, returning its value if it was present.
    pub fn invalidate(&self, key: &K) -> Option<V> {
        let removed = self.entries.lock().remove(key).map(|entry| entry.value);
        if removed.is_some() {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let removed = {
            let mut entries = self.entries.lock();
            let n = entries.len();
            entries.clear();
            n
        };
        self.counters
            .evictions
            .fetch_add(removed as u64, Ordering::Relaxed);
    }

    /// Number of stored entries, expired ones included until next touched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Records one population attempt.
    pub fn record_load(&self) {
        self.counters.loads.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of the statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
        }
    }
}
