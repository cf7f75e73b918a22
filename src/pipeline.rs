//! Search pipeline
//!
//! Drives one logical search end to end:
//! normalize -> failure-cache check -> result-cache read -> remote lookup
//! -> dedupe -> result-cache write. The remote lookup is an injected
//! dependency; the pipeline degrades to "no results" instead of surfacing
//! its failures to callers.

use crate::clock::{Clock, SystemClock};
use crate::config::SearchConfig;
use crate::coordinator::{SearchCoordinator, SearchExecutor};
use crate::dedupe::Deduplicator;
use crate::error::{normalize_query, validate_query, LookupError};
use crate::failure_cache::FailureCache;
use crate::model::{cache_key, CacheStats, LookupPage, SearchFilters, SearchResponse};
use crate::normalizer::generate_variants;
use crate::result_cache::ResultCache;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The remote lookup procedure.
///
/// Accepts a sanitized query string plus filter parameters and returns raw
/// candidate rows. Transport and validation failures surface as
/// `LookupError`; the pipeline owns retry suppression and caching.
pub trait CatalogLookup: Send + Sync {
    fn execute<'a>(
        &'a self,
        query: &'a str,
        filters: &'a SearchFilters,
    ) -> BoxFuture<'a, Result<LookupPage, LookupError>>;
}

/// The full search coordination and caching engine.
pub struct SearchPipeline {
    lookup: Arc<dyn CatalogLookup>,
    result_cache: Arc<ResultCache>,
    failure_cache: Arc<FailureCache>,
    deduper: Deduplicator,
    config: SearchConfig,
}

impl SearchPipeline {
    pub fn new(lookup: Arc<dyn CatalogLookup>, config: SearchConfig) -> Self {
        Self::with_clock(lookup, config, Arc::new(SystemClock))
    }

    /// Construct with an injected clock; tests drive TTLs manually.
    pub fn with_clock(
        lookup: Arc<dyn CatalogLookup>,
        config: SearchConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let result_cache = Arc::new(ResultCache::new(
            Arc::clone(&clock),
            config.result_ttl,
            config.result_capacity,
        ));
        let failure_cache = Arc::new(FailureCache::new(
            clock,
            config.failure_ttl,
            config.failure_capacity,
        ));
        let deduper = Deduplicator::new(config.similarity_threshold);

        Self {
            lookup,
            result_cache,
            failure_cache,
            deduper,
            config,
        }
    }

    /// Run one search through the whole pipeline.
    ///
    /// Invalid queries and failed lookups both come back as empty result
    /// sets; `lookup_failed` distinguishes the latter (including lookups
    /// suppressed by the failure cache).
    pub async fn search(&self, query: &str, filters: &SearchFilters) -> SearchResponse {
        if let Err(err) = validate_query(query) {
            debug!(error = %err, "rejected query handled locally");
            return SearchResponse::empty(false);
        }

        let trimmed = query.trim();
        let normalized = normalize_query(trimmed);

        if self.failure_cache.should_skip(trimmed) {
            debug!(query = %normalized, "suppressed by failure cache");
            return SearchResponse::empty(true);
        }

        let key = cache_key(&normalized, filters);
        if let Some(entry) = self.result_cache.get(&key) {
            return SearchResponse {
                results: entry.results,
                total_count: entry.total_count,
                cache_hit: true,
                lookup_failed: false,
            };
        }

        let page = match self.lookup.execute(trimmed, filters).await {
            Ok(page) => {
                self.failure_cache.mark_succeeded(trimmed);
                page
            }
            Err(err) => {
                warn!(query = %normalized, error = %err, "lookup failed");
                self.failure_cache
                    .mark_failed(trimmed, Some(&err.to_string()));
                return SearchResponse::empty(true);
            }
        };

        let page = if page.rows.is_empty() && self.config.variant_fallback {
            self.variant_fallback(trimmed, filters).await.unwrap_or(page)
        } else {
            page
        };

        let total_count = page.total_count;
        let results = self.deduper.deduplicate(page.rows);
        self.result_cache.put(&key, results.clone(), total_count);

        SearchResponse {
            results,
            total_count,
            cache_hit: false,
            lookup_failed: false,
        }
    }

    /// Auto-correction pass: when the primary query finds nothing, try a
    /// bounded number of normalizer variants and keep the first non-empty
    /// page. Variant failures are recorded like primary ones.
    async fn variant_fallback(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Option<LookupPage> {
        let variants = generate_variants(query);
        for variant in variants
            .iter()
            .skip(1)
            .take(self.config.variant_fallback_limit)
        {
            if self.failure_cache.should_skip(variant) {
                continue;
            }
            match self.lookup.execute(variant, filters).await {
                Ok(page) if !page.rows.is_empty() => {
                    info!(original = %query, variant = %variant, "variant fallback matched");
                    self.failure_cache.mark_succeeded(variant);
                    return Some(page);
                }
                Ok(_) => {}
                Err(err) => {
                    self.failure_cache
                        .mark_failed(variant, Some(&err.to_string()));
                }
            }
        }
        None
    }

    /// Build a debounced coordinator wired to this pipeline.
    ///
    /// The coordinator's executor runs `search` with default filters;
    /// completed results land in the result cache, where the consumer's
    /// next read picks them up.
    pub fn coordinator(self: &Arc<Self>) -> SearchCoordinator {
        let pipeline = Arc::clone(self);
        let executor: SearchExecutor = Arc::new(move |request| {
            let pipeline = Arc::clone(&pipeline);
            Box::pin(async move {
                pipeline
                    .search(&request.query, &SearchFilters::default())
                    .await;
                Ok(())
            })
        });
        SearchCoordinator::new(executor, self.config.debounce_delay)
    }

    /// Start the periodic result-cache eviction sweep.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        self.result_cache.spawn_sweeper(self.config.sweep_interval)
    }

    /// Drop all cached results and failure records.
    pub fn clear_cache(&self) {
        self.result_cache.clear();
        self.failure_cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.result_cache.stats()
    }

    pub fn result_cache(&self) -> &Arc<ResultCache> {
        &self.result_cache
    }

    pub fn failure_cache(&self) -> &Arc<FailureCache> {
        &self.failure_cache
    }
}
