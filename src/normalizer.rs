//! Query intent normalizer
//!
//! Pure, deterministic query rewriting: expands abbreviations, converts
//! numeral forms, normalizes punctuation, and strips sequel patterns to
//! widen recall without the caller re-typing. No I/O, no state beyond the
//! static lookup tables.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Bidirectional abbreviation table. Matches whole words, case-insensitively,
/// at the start of the query or as the entire query.
static ABBREVIATIONS: &[(&str, &str)] = &[
    ("gta", "grand theft auto"),
    ("cod", "call of duty"),
    ("gow", "god of war"),
    ("ac", "assassin's creed"),
    ("ff", "final fantasy"),
    ("re", "resident evil"),
    ("mgs", "metal gear solid"),
    ("dmc", "devil may cry"),
    ("nfs", "need for speed"),
    ("kh", "kingdom hearts"),
    ("rdr", "red dead redemption"),
    ("tlou", "the last of us"),
    ("botw", "breath of the wild"),
    ("totk", "tears of the kingdom"),
    ("wow", "world of warcraft"),
    ("tf", "team fortress"),
];

/// Roman numerals 1..=20, index = value - 1.
static ROMAN: &[&str] = &[
    "i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x", "xi", "xii",
    "xiii", "xiv", "xv", "xvi", "xvii", "xviii", "xix", "xx",
];

/// Number words one..=ten, index = value - 1.
static NUMBER_WORDS: &[&str] = &[
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];

/// Franchise keyword table for `detect_franchise` and the score bonus.
static FRANCHISES: &[(&str, &[&str])] = &[
    ("Grand Theft Auto", &["gta", "grand theft auto"]),
    ("Call of Duty", &["cod", "call of duty", "modern warfare", "black ops"]),
    ("The Legend of Zelda", &["zelda", "breath of the wild", "tears of the kingdom"]),
    ("Final Fantasy", &["final fantasy", "ffvii", "ffx"]),
    ("Assassin's Creed", &["assassin", "assassins creed"]),
    ("The Elder Scrolls", &["elder scrolls", "skyrim", "oblivion", "morrowind"]),
    ("Dark Souls", &["dark souls", "souls"]),
    ("Halo", &["halo", "master chief"]),
    ("Resident Evil", &["resident evil", "biohazard"]),
    ("Super Mario", &["mario"]),
    ("Pokemon", &["pokemon", "pokémon"]),
    ("The Witcher", &["witcher", "geralt"]),
];

static SEQUEL_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(?:part|episode|chapter)\s+(?:\d+|[ivxl]+)\b").unwrap()
});

static PAREN_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\(\d{4}\)").unwrap());

/// Generate plausible rewritten query strings for `query`.
///
/// The original (trimmed) query is always first; the remainder is a
/// deduplicated set whose order carries no meaning. Rules compose: every
/// produced variant is fed back through the rules until no new strings
/// appear, so "GTA V" yields both "grand theft auto v" and
/// "grand theft auto 5".
pub fn generate_variants(query: &str) -> Vec<String> {
    let original = query.trim().to_string();
    if original.is_empty() {
        return vec![original];
    }

    let mut variants: Vec<String> = vec![original.clone()];
    let mut seen: HashSet<String> = variants.iter().map(|v| v.to_lowercase()).collect();

    // Fixpoint over the rule set. Three rounds are enough for every
    // composition the rules can express (abbrev -> numeral -> punctuation).
    for _ in 0..3 {
        let mut produced = Vec::new();
        for variant in &variants {
            expand_abbreviations(variant, &mut produced);
            convert_numerals(variant, &mut produced);
            normalize_punctuation(variant, &mut produced);
            strip_sequel_patterns(variant, &mut produced);
        }

        let mut grew = false;
        for candidate in produced {
            let folded = candidate.to_lowercase();
            if !folded.is_empty() && seen.insert(folded) {
                variants.push(candidate);
                grew = true;
            }
        }
        if !grew {
            break;
        }
    }

    variants
}

/// Match the query against the static franchise table; first match wins.
pub fn detect_franchise(query: &str) -> Option<&'static str> {
    let folded = query.to_lowercase();
    FRANCHISES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| folded.contains(k)))
        .map(|(name, _)| *name)
}

/// Additive relevance score of a candidate name against the query.
///
/// Ties are left to the caller; a stable sort keeps input order for equal
/// scores.
pub fn score_result(query: &str, candidate_name: &str) -> u32 {
    let query_folded = query.trim().to_lowercase();
    let name_folded = candidate_name.to_lowercase();
    if query_folded.is_empty() {
        return 0;
    }

    let mut score = 0u32;

    if name_folded == query_folded {
        score += 100;
    }
    if name_folded.starts_with(&query_folded) {
        score += 50;
    }
    if name_folded.contains(&query_folded) {
        score += 30;
    }

    let name_tokens: HashSet<&str> = name_folded.split_whitespace().collect();
    for word in query_folded.split_whitespace() {
        if name_tokens.contains(word) {
            score += 20;
        } else if name_tokens.iter().any(|t| t.contains(word)) {
            score += 10;
        }
    }

    if let Some((_, keywords)) = FRANCHISES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| query_folded.contains(k)))
    {
        if keywords.iter().any(|k| name_folded.contains(k)) {
            score += 25;
        }
    }

    score
}

/// Abbreviation expansion and contraction at the start of the query.
fn expand_abbreviations(query: &str, out: &mut Vec<String>) {
    let folded = query.to_lowercase();
    for (abbrev, full) in ABBREVIATIONS {
        if let Some(rewritten) = replace_leading_phrase(&folded, query, abbrev, full) {
            out.push(rewritten);
        }
        if let Some(rewritten) = replace_leading_phrase(&folded, query, full, abbrev) {
            out.push(rewritten);
        }
    }
}

/// If `query` (lowercased as `folded`) equals `from` or starts with
/// `from` + space, substitute `to` for the leading phrase.
fn replace_leading_phrase(folded: &str, query: &str, from: &str, to: &str) -> Option<String> {
    if folded == from {
        return Some(to.to_string());
    }
    let prefix_len = from.len();
    if folded.starts_with(from)
        && folded[prefix_len..].starts_with(' ')
        && query.is_char_boundary(prefix_len)
    {
        return Some(format!("{}{}", to, &query[prefix_len..]));
    }
    None
}

/// Roman <-> Arabic (1..=20) and number-word <-> digit (1..=10) conversion
/// for standalone words.
fn convert_numerals(query: &str, out: &mut Vec<String>) {
    let words: Vec<&str> = query.split_whitespace().collect();

    for (idx, word) in words.iter().enumerate() {
        let folded = word.to_lowercase();

        if let Some(pos) = ROMAN.iter().position(|r| *r == folded) {
            out.push(replace_word(&words, idx, &(pos + 1).to_string()));
        }
        if let Ok(n) = folded.parse::<usize>() {
            if (1..=20).contains(&n) {
                out.push(replace_word(&words, idx, ROMAN[n - 1]));
            }
            if (1..=10).contains(&n) {
                out.push(replace_word(&words, idx, NUMBER_WORDS[n - 1]));
            }
        }
        if let Some(pos) = NUMBER_WORDS.iter().position(|w| *w == folded) {
            out.push(replace_word(&words, idx, &(pos + 1).to_string()));
        }
    }
}

fn replace_word(words: &[&str], idx: usize, replacement: &str) -> String {
    let mut rebuilt: Vec<&str> = words.to_vec();
    rebuilt[idx] = replacement;
    rebuilt.join(" ")
}

/// Colon, hyphen, apostrophe and "and"/"&" rewrites.
fn normalize_punctuation(query: &str, out: &mut Vec<String>) {
    if query.contains(':') {
        out.push(collapse_spaces(&query.replace(':', "")));
        out.push(collapse_spaces(&query.replace(':', " ")));
    }
    if query.contains('-') {
        out.push(collapse_spaces(&query.replace('-', "")));
        out.push(collapse_spaces(&query.replace('-', " ")));
    }
    if query.contains('\'') || query.contains('\u{2019}') {
        out.push(query.replace(['\'', '\u{2019}'], ""));
    }

    let folded = query.to_lowercase();
    if let Some(pos) = folded.find(" and ") {
        if query.is_char_boundary(pos) && query.is_char_boundary(pos + 5) {
            out.push(format!("{} & {}", &query[..pos], &query[pos + 5..]));
        }
    }
    if query.contains(" & ") {
        out.push(query.replacen(" & ", " and ", 1));
    }
}

/// Strip "part/episode/chapter N" suffixes and parenthesized years to
/// recover a base-title variant.
fn strip_sequel_patterns(query: &str, out: &mut Vec<String>) {
    if SEQUEL_SUFFIX.is_match(query) {
        out.push(collapse_spaces(&SEQUEL_SUFFIX.replace_all(query, "")));
    }
    if PAREN_YEAR.is_match(query) {
        out.push(collapse_spaces(&PAREN_YEAR.replace_all(query, "")));
    }
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants_folded(query: &str) -> HashSet<String> {
        generate_variants(query)
            .into_iter()
            .map(|v| v.to_lowercase())
            .collect()
    }

    #[test]
    fn test_original_always_included_first() {
        let variants = generate_variants("Some Unknown Title");
        assert_eq!(variants[0], "Some Unknown Title");

        let variants = generate_variants("GTA V");
        assert_eq!(variants[0], "GTA V");
    }

    #[test]
    fn test_gta_v_compound_expansion() {
        let variants = variants_folded("GTA V");
        assert!(variants.contains("grand theft auto v"));
        // Abbreviation expansion and numeral conversion compose.
        assert!(variants.contains("grand theft auto 5"));
    }

    #[test]
    fn test_abbreviation_contraction() {
        let variants = variants_folded("Grand Theft Auto V");
        assert!(variants.contains("gta v"));
    }

    #[test]
    fn test_abbreviation_only_at_start() {
        // "gta" embedded mid-query must not expand.
        let variants = variants_folded("playing gta tonight");
        assert!(!variants.iter().any(|v| v.contains("grand theft auto")));
    }

    #[test]
    fn test_roman_to_arabic_and_back() {
        let variants = variants_folded("Final Fantasy VII");
        assert!(variants.contains("final fantasy 7"));

        let variants = variants_folded("Final Fantasy 7");
        assert!(variants.contains("final fantasy vii"));
    }

    #[test]
    fn test_number_words() {
        let variants = variants_folded("Halo two");
        assert!(variants.contains("halo 2"));

        let variants = variants_folded("Halo 2");
        assert!(variants.contains("halo two"));
    }

    #[test]
    fn test_colon_and_hyphen_normalization() {
        let variants = variants_folded("Halo: Combat Evolved");
        assert!(variants.contains("halo combat evolved"));

        let variants = variants_folded("Spider-Man");
        assert!(variants.contains("spiderman"));
        assert!(variants.contains("spider man"));
    }

    #[test]
    fn test_apostrophe_stripping() {
        let variants = variants_folded("Assassin's Creed");
        assert!(variants.contains("assassins creed"));
    }

    #[test]
    fn test_and_ampersand_substitution() {
        let variants = variants_folded("Ratchet and Clank");
        assert!(variants.contains("ratchet & clank"));

        let variants = variants_folded("Ratchet & Clank");
        assert!(variants.contains("ratchet and clank"));
    }

    #[test]
    fn test_sequel_pattern_stripping() {
        let variants = variants_folded("Senua's Saga part II");
        assert!(variants.contains("senuas saga"));

        let variants = variants_folded("Doom (2016)");
        assert!(variants.contains("doom"));
    }

    #[test]
    fn test_variants_are_deduplicated() {
        let variants = generate_variants("halo");
        let folded: HashSet<String> = variants.iter().map(|v| v.to_lowercase()).collect();
        assert_eq!(folded.len(), variants.len());
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(generate_variants("   "), vec!["".to_string()]);
    }

    #[test]
    fn test_detect_franchise() {
        assert_eq!(detect_franchise("gta vice city"), Some("Grand Theft Auto"));
        assert_eq!(detect_franchise("Skyrim remastered"), Some("The Elder Scrolls"));
        assert_eq!(detect_franchise("obscure indie title"), None);
    }

    #[test]
    fn test_score_exact_match_dominates() {
        let exact = score_result("Doom", "Doom");
        let prefix = score_result("Doom", "Doom Eternal");
        let substring = score_result("Doom", "Ultimate Doom Pack");
        assert!(exact > prefix);
        assert!(prefix > substring);
        assert!(substring > 0);
    }

    #[test]
    fn test_score_token_matches() {
        // Word-level exact token beats partial containment.
        let token = score_result("dark souls", "Dark Souls Remastered");
        let partial = score_result("dark souls", "Darkest Dungeon");
        assert!(token > partial);
    }

    #[test]
    fn test_score_franchise_bonus() {
        let with_bonus = score_result("zelda", "The Legend of Zelda");
        let without = score_result("zelda", "Unrelated Adventure");
        assert!(with_bonus > without);
        assert_eq!(score_result("xyz unrelated", "Completely Different"), 0);
    }
}
