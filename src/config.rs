//! Configuration for the search pipeline
//!
//! All tunables have production defaults; tests override individual knobs
//! through the `with_*` methods.

use std::time::Duration;

/// Tunables for the caches, the deduplication engine, and the coordinator.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// How long a completed result set stays servable.
    pub result_ttl: Duration,
    /// Maximum number of result-cache entries kept after an eviction pass.
    pub result_capacity: usize,
    /// How long a failed query suppresses retries.
    pub failure_ttl: Duration,
    /// Maximum number of failure-cache entries.
    pub failure_capacity: usize,
    /// Pairwise similarity at or above this joins a duplicate group.
    pub similarity_threshold: f64,
    /// Debounce window between a request and its execution.
    pub debounce_delay: Duration,
    /// Interval between periodic result-cache eviction sweeps.
    pub sweep_interval: Duration,
    /// Whether a zero-row lookup retries with normalizer variants.
    pub variant_fallback: bool,
    /// Maximum number of variants tried on fallback.
    pub variant_fallback_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_ttl: Duration::from_secs(300),
            result_capacity: 100,
            failure_ttl: Duration::from_secs(3600),
            failure_capacity: 100,
            similarity_threshold: 0.8,
            debounce_delay: Duration::from_millis(1500),
            sweep_interval: Duration::from_secs(60),
            variant_fallback: true,
            variant_fallback_limit: 3,
        }
    }
}

impl SearchConfig {
    pub fn with_result_ttl(mut self, ttl: Duration) -> Self {
        self.result_ttl = ttl;
        self
    }

    pub fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = capacity;
        self
    }

    pub fn with_failure_ttl(mut self, ttl: Duration) -> Self {
        self.failure_ttl = ttl;
        self
    }

    pub fn with_failure_capacity(mut self, capacity: usize) -> Self {
        self.failure_capacity = capacity;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_variant_fallback(mut self, enabled: bool) -> Self {
        self.variant_fallback = enabled;
        self
    }
}
