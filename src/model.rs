//! Core data types for the search pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One catalog row as returned by the remote lookup.
///
/// Immutable once fetched; the deduplication engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameRow {
    /// Catalog-local identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// IGDB external identifier, when the row is linked
    pub igdb_id: Option<u64>,

    /// First release date
    pub release_date: Option<NaiveDate>,

    /// Platforms the title shipped on
    #[serde(default)]
    pub platforms: Vec<String>,

    /// Cover image URL
    pub cover_url: Option<String>,

    /// Short description for result lists
    pub summary: Option<String>,
}

impl GameRow {
    /// Minimal row for tests and examples.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            igdb_id: None,
            release_date: None,
            platforms: Vec::new(),
            cover_url: None,
            summary: None,
        }
    }

    pub fn with_igdb_id(mut self, igdb_id: u64) -> Self {
        self.igdb_id = Some(igdb_id);
        self
    }

    pub fn with_release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }
}

/// Filter parameters accompanying a query.
///
/// Filters participate in the cache key through a canonical sorted-by-field
/// serialization, so the same logical filter set always produces the same
/// key regardless of construction order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchFilters {
    #[serde(default)]
    pub platforms: Vec<String>,

    #[serde(default)]
    pub genres: Vec<String>,

    pub min_rating: Option<u32>,

    pub release_year: Option<i32>,
}

impl SearchFilters {
    /// Canonical serialization of all non-default filter values,
    /// sorted by field name. Empty when no filters are set.
    ///
    /// List values go through JSON so separators inside filter strings
    /// cannot collide with the fragment's own delimiters.
    pub fn cache_key_fragment(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if !self.genres.is_empty() {
            let mut genres = self.genres.clone();
            genres.sort();
            parts.push(format!("genres={}", json_list(&genres)));
        }
        if let Some(rating) = self.min_rating {
            parts.push(format!("min_rating={}", rating));
        }
        if !self.platforms.is_empty() {
            let mut platforms = self.platforms.clone();
            platforms.sort();
            parts.push(format!("platforms={}", json_list(&platforms)));
        }
        if let Some(year) = self.release_year {
            parts.push(format!("release_year={}", year));
        }

        // Field names above are already pushed in sorted order; keep the
        // explicit sort so a reordering of the code cannot change keys.
        parts.sort();
        parts.join("&")
    }
}

fn json_list(values: &[String]) -> String {
    // Serializing a list of strings cannot fail.
    serde_json::to_string(values).unwrap_or_default()
}

/// Compose the result-cache key from a normalized query and its filters.
pub fn cache_key(normalized_query: &str, filters: &SearchFilters) -> String {
    let fragment = filters.cache_key_fragment();
    if fragment.is_empty() {
        normalized_query.to_string()
    } else {
        format!("{}|{}", normalized_query, fragment)
    }
}

/// A single coordinator-owned search request.
///
/// Created per `request_search` call; superseded requests are dropped
/// without ever executing.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Monotonically increasing token identifying this request
    pub id: u64,

    /// Logical consumer that submitted the request
    pub source: String,

    /// Raw query text
    pub query: String,

    /// Submission instant
    pub submitted_at: Instant,
}

/// Rows returned by the remote lookup before deduplication.
#[derive(Debug, Clone)]
pub struct LookupPage {
    pub rows: Vec<GameRow>,
    pub total_count: usize,
}

/// Final outcome of a pipeline search.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    /// Deduplicated rows in first-occurrence order
    pub results: Vec<GameRow>,

    /// Total matching rows reported by the remote store
    pub total_count: usize,

    /// Whether the response was served from the result cache
    pub cache_hit: bool,

    /// Whether the lookup failed (or was suppressed by the failure cache);
    /// a failed search degrades to an empty result set instead of erroring
    pub lookup_failed: bool,
}

impl SearchResponse {
    /// Empty response for validation failures and suppressed lookups.
    pub fn empty(lookup_failed: bool) -> Self {
        Self {
            results: Vec::new(),
            total_count: 0,
            cache_hit: false,
            lookup_failed,
        }
    }
}

/// Result-cache statistics for operators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    /// Live entries
    pub size: usize,

    /// Hits divided by total reads since construction (0.0 when unread)
    pub hit_rate: f64,
}
