//! Failure cache
//!
//! Records queries whose remote lookup failed recently so the pipeline can
//! skip re-issuing them. The skip is a soft hint: nothing here ever fails,
//! and callers remain free to bypass it for manual retries.

use crate::clock::Clock;
use crate::error::normalize_query;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// One recorded failure, keyed by normalized query.
#[derive(Debug, Clone)]
pub struct FailureEntry {
    pub normalized_query: String,
    pub failed_at: Instant,
    pub failure_count: u32,
    pub last_error: Option<String>,
    /// Insertion sequence; eviction removes the oldest-inserted entry.
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, FailureEntry>,
    next_seq: u64,
}

/// Bounded map of recently failed queries with lazy TTL expiry.
pub struct FailureCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    capacity: usize,
    inner: Mutex<Inner>,
}

impl FailureCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration, capacity: usize) -> Self {
        Self {
            clock,
            ttl,
            capacity,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// True iff a non-expired failure is recorded for this query.
    ///
    /// Expired entries are removed as a side effect of the check; no
    /// background sweep is needed for correctness.
    pub fn should_skip(&self, query: &str) -> bool {
        let key = normalize_query(query);
        let now = self.clock.now();
        let mut inner = self.inner.lock().unwrap();

        match inner.entries.get(&key) {
            Some(entry) if now.duration_since(entry.failed_at) < self.ttl => {
                debug!(query = %key, failures = entry.failure_count, "skipping recently failed query");
                true
            }
            Some(_) => {
                inner.entries.remove(&key);
                false
            }
            None => false,
        }
    }

    /// Record a failed lookup, updating the entry in place when the query
    /// already failed before.
    pub fn mark_failed(&self, query: &str, error: Option<&str>) {
        let key = normalize_query(query);
        let now = self.clock.now();
        let mut inner = self.inner.lock().unwrap();

        if let Some(entry) = inner.entries.get_mut(&key) {
            entry.failure_count += 1;
            entry.failed_at = now;
            entry.last_error = error.map(str::to_string);
            return;
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key.clone(),
            FailureEntry {
                normalized_query: key,
                failed_at: now,
                failure_count: 1,
                last_error: error.map(str::to_string),
                seq,
            },
        );

        // Insertion-order eviction, not access-order.
        if inner.entries.len() > self.capacity {
            if let Some(oldest) = inner
                .entries
                .values()
                .min_by_key(|e| e.seq)
                .map(|e| e.normalized_query.clone())
            {
                debug!(query = %oldest, "evicting oldest failure entry");
                inner.entries.remove(&oldest);
            }
        }
    }

    /// A later success clears any prior failure history for the query.
    pub fn mark_succeeded(&self, query: &str) {
        let key = normalize_query(query);
        self.inner.lock().unwrap().entries.remove(&key);
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of one entry, for diagnostics.
    pub fn entry(&self, query: &str) -> Option<FailureEntry> {
        let key = normalize_query(query);
        self.inner.lock().unwrap().entries.get(&key).cloned()
    }
}
