//! gamesearch: in-process search coordination and caching engine
//!
//! Turns a raw user-typed catalog query into a ranked, deduplicated result
//! set while avoiding redundant backend calls and repeated work against
//! queries known to fail. Five tightly coupled pieces:
//!
//! - [`normalizer`]: pure query rewriting (abbreviations, numerals,
//!   punctuation, sequel patterns) plus franchise detection and relevance
//!   scoring
//! - [`failure_cache`]: suppresses retries of recently failed queries
//! - [`result_cache`]: time-boxed, size-bounded storage of completed
//!   result sets with frequency-based eviction
//! - [`dedupe`]: greedy single-pass collapse of near-duplicate rows
//! - [`coordinator`]: debounced "one search in flight" scheduling
//!
//! [`pipeline::SearchPipeline`] drives the whole flow; the actual data-store
//! query is injected through [`pipeline::CatalogLookup`].

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod dedupe;
pub mod error;
pub mod failure_cache;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod result_cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SearchConfig;
pub use coordinator::{SearchCoordinator, SearchExecutor};
pub use dedupe::{similarity, Deduplicator, DuplicateGroup, MatchType};
pub use error::{normalize_query, validate_query, LookupError, SearchError};
pub use failure_cache::FailureCache;
pub use model::{
    cache_key, CacheStats, GameRow, LookupPage, SearchFilters, SearchRequest, SearchResponse,
};
pub use normalizer::{detect_franchise, generate_variants, score_result};
pub use pipeline::{CatalogLookup, SearchPipeline};
pub use result_cache::{CacheEntry, ResultCache};
