//! Search coordinator
//!
//! Owns the "one search in flight" semantics: rapid successive requests are
//! debounced, superseded requests are cancelled before they ever run, and a
//! still-active guard discards results that arrive after supersession.
//!
//! The active slot is global, not per source. Two different consumers
//! issuing concurrent searches cancel each other; that is the shipped
//! behavior and the tests document it explicitly.

use crate::error::LookupError;
use crate::model::SearchRequest;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The externally supplied lookup procedure driven by the coordinator.
///
/// Errors are the executor's own to report through its return channel; the
/// coordinator only logs them.
pub type SearchExecutor =
    Arc<dyn Fn(SearchRequest) -> BoxFuture<'static, Result<(), LookupError>> + Send + Sync>;

struct ActiveSlot {
    id: u64,
    handle: JoinHandle<()>,
}

/// Debounced single-slot request scheduler.
pub struct SearchCoordinator {
    executor: SearchExecutor,
    default_delay: Duration,
    active: Arc<Mutex<Option<ActiveSlot>>>,
    next_id: AtomicU64,
}

impl SearchCoordinator {
    pub fn new(executor: SearchExecutor, default_delay: Duration) -> Self {
        Self {
            executor,
            default_delay,
            active: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
        }
    }

    /// Schedule a search, superseding whatever currently holds the slot.
    ///
    /// With `immediate` the request runs right away; otherwise it waits out
    /// the debounce window (`delay`, or the configured default). The
    /// superseded request's task is aborted, so its timer never fires and
    /// it never reports a result or error.
    pub fn request_search(
        &self,
        source: &str,
        query: &str,
        delay: Option<Duration>,
        immediate: bool,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let request = SearchRequest {
            id,
            source: source.to_string(),
            query: query.to_string(),
            submitted_at: Instant::now(),
        };
        let delay = delay.unwrap_or(self.default_delay);
        let executor = Arc::clone(&self.executor);
        let active = Arc::clone(&self.active);

        // Hold the slot lock across the spawn so the new task cannot
        // observe the slot before its own id is written. The task's first
        // lock acquisition blocks until this function releases; nothing
        // here awaits while holding the lock.
        let mut slot = self.active.lock().unwrap();
        if let Some(prev) = slot.take() {
            debug!(superseded = prev.id, by = id, "cancelling pending search");
            prev.handle.abort();
        }

        let handle = tokio::spawn(async move {
            if !immediate {
                tokio::time::sleep(delay).await;
            }

            // Guard against the race where cancellation and firing
            // interleave: only the current slot holder may execute.
            {
                let slot = active.lock().unwrap();
                if slot.as_ref().map(|s| s.id) != Some(id) {
                    return;
                }
            }

            if let Err(err) = (executor)(request).await {
                // Delivery scheduling is this layer's job, not error
                // surfacing; the lookup reports through its own channel.
                warn!(request = id, error = %err, "search execution failed");
            }

            // Clear the slot only if a newer request has not taken it.
            let mut slot = active.lock().unwrap();
            if slot.as_ref().map(|s| s.id) == Some(id) {
                *slot = None;
            }
        });

        *slot = Some(ActiveSlot { id, handle });
        id
    }

    /// True iff a request currently holds the active slot, pending or
    /// executing.
    pub fn is_active(&self) -> bool {
        self.active.lock().unwrap().is_some()
    }

    /// Abort whatever holds the slot; used on teardown.
    pub fn cancel(&self) {
        let mut slot = self.active.lock().unwrap();
        if let Some(prev) = slot.take() {
            debug!(cancelled = prev.id, "cancelling active search");
            prev.handle.abort();
        }
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        self.cancel();
    }
}
