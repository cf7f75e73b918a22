//! Result cache
//!
//! Time-boxed, size-bounded storage for completed result sets. Reads expire
//! lazily against the TTL; a periodic sweep (plus on-demand `evict`) purges
//! expired entries and trims the map to capacity by lowest hit count.

use crate::clock::Clock;
use crate::model::{CacheStats, GameRow};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// One cached result set.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub results: Vec<GameRow>,
    pub total_count: usize,
    pub stored_at: Instant,
    pub hit_count: u64,
}

#[derive(Debug, Default)]
struct Counters {
    reads: u64,
    hits: u64,
}

/// TTL + frequency-evicted cache of completed searches.
pub struct ResultCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
    counters: Mutex<Counters>,
}

impl ResultCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration, capacity: usize) -> Self {
        Self {
            clock,
            ttl,
            capacity,
            entries: Mutex::new(HashMap::new()),
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Fetch a live entry, bumping its hit count.
    ///
    /// An expired entry is deleted as a side effect and reported as a miss.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();
        let mut counters = self.counters.lock().unwrap();
        counters.reads += 1;

        match entries.get_mut(key) {
            Some(entry) if now.duration_since(entry.stored_at) <= self.ttl => {
                entry.hit_count += 1;
                counters.hits += 1;
                debug!(key, hits = entry.hit_count, "result cache hit");
                Some(entry.clone())
            }
            Some(_) => {
                entries.remove(key);
                debug!(key, "result cache entry expired");
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite the entry for `key`, trimming to capacity when
    /// the insert pushes the map over the bound.
    pub fn put(&self, key: &str, results: Vec<GameRow>, total_count: usize) {
        let entry = CacheEntry {
            key: key.to_string(),
            results,
            total_count,
            stored_at: self.clock.now(),
            hit_count: 0,
        };
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), entry);

        let evicted = Self::trim_to_capacity(&mut entries, self.capacity);
        if evicted > 0 {
            debug!(evicted, remaining = entries.len(), "trimmed result cache on insert");
        }
    }

    /// TTL purge followed by frequency-based trimming to capacity.
    ///
    /// The capacity bound is already kept by `put`; this pass additionally
    /// drops entries that expired without being read again.
    pub fn evict(&self) {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();

        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.stored_at) <= self.ttl);
        let expired = before - entries.len();

        let evicted = Self::trim_to_capacity(&mut entries, self.capacity);

        if expired > 0 || evicted > 0 {
            info!(expired, evicted, remaining = entries.len(), "result cache eviction pass");
        }
    }

    /// Remove lowest-hit-count entries until at most `capacity` remain.
    /// Ties break by key order so the outcome is deterministic.
    fn trim_to_capacity(entries: &mut HashMap<String, CacheEntry>, capacity: usize) -> usize {
        if entries.len() <= capacity {
            return 0;
        }

        let mut ranked: Vec<(u64, String)> = entries
            .values()
            .map(|e| (e.hit_count, e.key.clone()))
            .collect();
        ranked.sort();

        let excess = entries.len() - capacity;
        for (_, key) in ranked.iter().take(excess) {
            entries.remove(key);
        }
        excess
    }

    /// Run `evict` every `interval` on a background task.
    ///
    /// The returned handle can be aborted on teardown; the sweep only takes
    /// the map lock briefly, so foreground reads are not blocked across
    /// awaits.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.evict();
            }
        })
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size and hit-rate statistics for operators.
    pub fn stats(&self) -> CacheStats {
        let size = self.len();
        let counters = self.counters.lock().unwrap();
        let hit_rate = if counters.reads == 0 {
            0.0
        } else {
            counters.hits as f64 / counters.reads as f64
        };
        CacheStats { size, hit_rate }
    }
}
