//! Deduplication engine
//!
//! Collapses near-identical catalog rows in a single result set into
//! canonical records. The grouping is a greedy single left-to-right pass:
//! a row's assignment depends on the rows encountered before it, and two
//! duplicates separated by a dissimilar row can land in different groups.
//! That asymmetry matches the shipped behavior and is kept on purpose; do
//! not replace it with transitive-closure clustering.

use crate::model::GameRow;
use std::collections::HashSet;
use tracing::debug;

/// How a duplicate group was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// Shared external (IGDB) identifier
    ExternalId,
    /// Exact case-insensitive name match
    Exact,
    /// Levenshtein similarity over the threshold
    Fuzzy,
}

/// One collapsed group; transient, computed per search.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub canonical_id: String,
    pub duplicate_ids: HashSet<String>,
    /// Highest pairwise similarity in the group, clamped to [0, 1]
    pub confidence: f64,
    pub match_type: MatchType,
}

/// Greedy near-duplicate collapser.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    threshold: f64,
}

impl Deduplicator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Collapse duplicates, keeping only each group's canonical row in
    /// first-occurrence order. Inputs of length <= 1 pass through.
    pub fn deduplicate(&self, rows: Vec<GameRow>) -> Vec<GameRow> {
        if rows.len() <= 1 {
            return rows;
        }

        let groups = self.group(&rows);
        let dropped: HashSet<&String> = groups
            .iter()
            .flat_map(|g| g.duplicate_ids.iter())
            .collect();

        if !dropped.is_empty() {
            debug!(groups = groups.len(), dropped = dropped.len(), "collapsed duplicate rows");
        }

        rows.into_iter()
            .filter(|row| !dropped.contains(&row.id))
            .collect()
    }

    /// Compute duplicate groups without dropping rows.
    ///
    /// Only groups that actually absorbed duplicates are returned.
    pub fn group(&self, rows: &[GameRow]) -> Vec<DuplicateGroup> {
        let mut assigned = vec![false; rows.len()];
        let mut groups = Vec::new();

        for i in 0..rows.len() {
            if assigned[i] {
                continue;
            }
            assigned[i] = true;

            let canonical = &rows[i];
            let mut duplicate_ids = HashSet::new();
            let mut best_similarity = 0.0f64;
            let mut match_type = MatchType::Fuzzy;

            for (j, row) in rows.iter().enumerate().skip(i + 1) {
                if assigned[j] {
                    continue;
                }
                let sim = similarity(canonical, row);
                if sim >= self.threshold {
                    assigned[j] = true;
                    duplicate_ids.insert(row.id.clone());
                    if sim > best_similarity {
                        best_similarity = sim;
                    }
                    match match_type {
                        MatchType::ExternalId => {}
                        _ if shares_external_id(canonical, row) => {
                            match_type = MatchType::ExternalId;
                        }
                        MatchType::Exact => {}
                        _ if names_match(canonical, row) => {
                            match_type = MatchType::Exact;
                        }
                        _ => {}
                    }
                }
            }

            if !duplicate_ids.is_empty() {
                groups.push(DuplicateGroup {
                    canonical_id: canonical.id.clone(),
                    duplicate_ids,
                    confidence: best_similarity.min(1.0),
                    match_type,
                });
            }
        }

        groups
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(0.8)
    }
}

fn shares_external_id(a: &GameRow, b: &GameRow) -> bool {
    matches!((a.igdb_id, b.igdb_id), (Some(x), Some(y)) if x == y)
}

fn names_match(a: &GameRow, b: &GameRow) -> bool {
    a.name.to_lowercase() == b.name.to_lowercase()
}

/// Pairwise similarity of two rows.
///
/// Matching external ids short-circuit at 1.0; exact case-insensitive names
/// score 0.95; otherwise normalized Levenshtein similarity of the lowercased
/// names plus a 0.2 bonus when both release dates fall within 365 days.
/// The sum is deliberately unclamped (only the threshold comparison
/// matters); absent optional fields degrade the score instead of failing.
pub fn similarity(a: &GameRow, b: &GameRow) -> f64 {
    if shares_external_id(a, b) {
        return 1.0;
    }

    let name_a = a.name.to_lowercase();
    let name_b = b.name.to_lowercase();
    if name_a == name_b {
        return 0.95;
    }

    let len_a = name_a.chars().count();
    let len_b = name_b.chars().count();
    let max_len = len_a.max(len_b);
    let name_similarity = if max_len == 0 {
        1.0
    } else {
        1.0 - levenshtein(&name_a, &name_b) as f64 / max_len as f64
    };

    let date_bonus = match (a.release_date, b.release_date) {
        (Some(da), Some(db)) if (da - db).num_days().abs() <= 365 => 0.2,
        _ => 0.0,
    };

    name_similarity + date_bonus
}

/// Classic two-row Levenshtein edit distance over characters.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("halo", "halo"), 0);
    }

    #[test]
    fn test_similarity_external_id_short_circuits() {
        let a = GameRow::new("1", "Doom").with_igdb_id(100);
        let b = GameRow::new("2", "Completely Different Name").with_igdb_id(100);
        assert_eq!(similarity(&a, &b), 1.0);
    }

    #[test]
    fn test_similarity_self_with_external_id() {
        let a = GameRow::new("1", "Doom").with_igdb_id(100);
        assert_eq!(similarity(&a, &a), 1.0);
    }

    #[test]
    fn test_similarity_exact_name_case_insensitive() {
        let a = GameRow::new("1", "Doom");
        let b = GameRow::new("2", "DOOM");
        assert_eq!(similarity(&a, &b), 0.95);
    }

    #[test]
    fn test_similarity_date_bonus() {
        let a = GameRow::new("1", "Halo 2").with_release_date(date(2004, 11, 9));
        let b = GameRow::new("2", "Halo Two").with_release_date(date(2004, 11, 9));
        let with_dates = similarity(&a, &b);

        let c = GameRow::new("3", "Halo 2");
        let d = GameRow::new("4", "Halo Two");
        let without_dates = similarity(&c, &d);

        assert!((with_dates - without_dates - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_distant_dates_no_bonus() {
        let a = GameRow::new("1", "Halo 2").with_release_date(date(2004, 11, 9));
        let b = GameRow::new("2", "Halo Two").with_release_date(date(2010, 1, 1));
        let c = GameRow::new("3", "Halo 2");
        let d = GameRow::new("4", "Halo Two");
        assert_eq!(similarity(&a, &b), similarity(&c, &d));
    }

    #[test]
    fn test_deduplicate_short_inputs_pass_through() {
        let deduper = Deduplicator::default();
        assert!(deduper.deduplicate(vec![]).is_empty());

        let one = vec![GameRow::new("1", "Doom")];
        assert_eq!(deduper.deduplicate(one.clone()), one);
    }

    #[test]
    fn test_external_id_group() {
        let deduper = Deduplicator::default();
        let rows = vec![
            GameRow::new("1", "Doom").with_igdb_id(100),
            GameRow::new("2", "DOOM").with_igdb_id(100),
        ];

        let groups = deduper.group(&rows);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].canonical_id, "1");
        assert_eq!(groups[0].match_type, MatchType::ExternalId);
        assert_eq!(groups[0].confidence, 1.0);

        let surviving = deduper.deduplicate(rows);
        assert_eq!(surviving.len(), 1);
        assert_eq!(surviving[0].id, "1");
    }

    #[test]
    fn test_exact_name_group() {
        let deduper = Deduplicator::default();
        let rows = vec![
            GameRow::new("1", "Celeste"),
            GameRow::new("2", "CELESTE"),
        ];

        let groups = deduper.group(&rows);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].match_type, MatchType::Exact);
    }

    #[test]
    fn test_fuzzy_group_with_date_bonus() {
        let deduper = Deduplicator::default();
        let rows = vec![
            GameRow::new("1", "Halo 2").with_release_date(date(2004, 11, 9)),
            GameRow::new("2", "Halo Two").with_release_date(date(2004, 11, 9)),
        ];

        let groups = deduper.group(&rows);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].match_type, MatchType::Fuzzy);

        let surviving = deduper.deduplicate(rows);
        assert_eq!(surviving.len(), 1);
        assert_eq!(surviving[0].name, "Halo 2");
    }

    #[test]
    fn test_first_occurrence_order_preserved() {
        let deduper = Deduplicator::default();
        let rows = vec![
            GameRow::new("1", "Zelda"),
            GameRow::new("2", "Doom").with_igdb_id(7),
            GameRow::new("3", "Mario"),
            GameRow::new("4", "DOOM").with_igdb_id(7),
        ];

        let surviving = deduper.deduplicate(rows);
        let ids: Vec<&str> = surviving.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_deduplicate_is_idempotent() {
        let deduper = Deduplicator::default();
        let rows = vec![
            GameRow::new("1", "Doom").with_igdb_id(100),
            GameRow::new("2", "DOOM").with_igdb_id(100),
            GameRow::new("3", "Halo 2").with_release_date(date(2004, 11, 9)),
            GameRow::new("4", "Halo Two").with_release_date(date(2004, 11, 9)),
            GameRow::new("5", "Stardew Valley"),
        ];

        let once = deduper.deduplicate(rows);
        let twice = deduper.deduplicate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_greedy_pass_is_not_transitive() {
        // "abcdef" ~ "abcdxf" and "abcdxf" ~ "abxdxf" can both clear the
        // threshold while "abcdef" ~ "abxdxf" does not. The greedy pass
        // anchors on the first row, so the third row starts its own group
        // instead of chaining through the second. Pinned behavior.
        let deduper = Deduplicator::new(0.8);
        let rows = vec![
            GameRow::new("1", "abcdef"),
            GameRow::new("2", "abcdxf"),
            GameRow::new("3", "abxdxf"),
        ];

        assert!(similarity(&rows[0], &rows[1]) >= 0.8);
        assert!(similarity(&rows[1], &rows[2]) >= 0.8);
        assert!(similarity(&rows[0], &rows[2]) < 0.8);

        let surviving = deduper.deduplicate(rows);
        let ids: Vec<&str> = surviving.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_missing_fields_degrade_gracefully() {
        let a = GameRow::new("1", "");
        let b = GameRow::new("2", "Something");
        // Empty vs non-empty name: zero similarity, no panic.
        assert_eq!(similarity(&a, &b), 0.0);

        let c = GameRow::new("3", "");
        let d = GameRow::new("4", "");
        // Two empty names hit the exact-name rule.
        assert_eq!(similarity(&c, &d), 0.95);
    }
}
