//! Error types and query validation for the search pipeline

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Maximum accepted query length in characters.
pub const MAX_QUERY_LENGTH: usize = 500;

/// Failure reported by the injected remote lookup procedure.
///
/// The pipeline records these into the failure cache and degrades to an
/// empty result set; it never surfaces them to the end caller.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("remote rejected query: {0}")]
    Rejected(String),

    #[error("lookup timed out")]
    Timeout,
}

/// Pipeline-level error taxonomy.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("lookup failed: {0}")]
    LookupFailed(#[from] LookupError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Validate a raw user query before any processing.
///
/// Empty (after trimming) and oversized queries are rejected; the pipeline
/// handles the rejection locally by returning an empty result set.
pub fn validate_query(query: &str) -> Result<(), SearchError> {
    if query.trim().is_empty() {
        return Err(SearchError::InvalidInput("Query cannot be empty".to_string()));
    }

    if query.chars().count() > MAX_QUERY_LENGTH {
        return Err(SearchError::InvalidInput(format!(
            "Query too long, maximum {} characters",
            MAX_QUERY_LENGTH
        )));
    }

    Ok(())
}

/// Normalize a query into the canonical cache/failure key form:
/// lowercased, whitespace-trimmed, accents stripped.
///
/// Accent stripping goes through NFKD decomposition and drops combining
/// marks, so "Pokémon" and "Pokemon" share one key.
pub fn normalize_query(query: &str) -> String {
    query
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_lowercase()
}

fn is_combining_mark(c: char) -> bool {
    // Combining Diacritical Marks and their extended/supplement blocks.
    matches!(c,
        '\u{0300}'..='\u{036F}'
        | '\u{1AB0}'..='\u{1AFF}'
        | '\u{1DC0}'..='\u{1DFF}'
        | '\u{20D0}'..='\u{20FF}'
        | '\u{FE20}'..='\u{FE2F}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_query_empty() {
        assert!(validate_query("").is_err());
        assert!(validate_query("   ").is_err());
    }

    #[test]
    fn test_validate_query_too_long() {
        let long = "a".repeat(MAX_QUERY_LENGTH + 1);
        assert!(validate_query(&long).is_err());
    }

    #[test]
    fn test_validate_query_ok() {
        assert!(validate_query("Halo 2").is_ok());
    }

    #[test]
    fn test_normalize_query_basic() {
        assert_eq!(normalize_query("  Grand Theft Auto V  "), "grand theft auto v");
    }

    #[test]
    fn test_normalize_query_accents() {
        assert_eq!(normalize_query("Pokémon"), "pokemon");
        assert_eq!(normalize_query("Ōkami"), "okami");
    }

    #[test]
    fn test_lookup_error_display() {
        let err = LookupError::Transport("connection reset".to_string());
        assert!(err.to_string().contains("connection reset"));
    }
}
