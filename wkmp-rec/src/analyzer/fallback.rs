//! Heuristic prompt analysis
//!
//! Terminal safety net for the analyzer: pure string work, never fails.

use super::prompt_keywords;
use crate::types::{Constraints, QueryAnalysis};
use once_cell::sync::Lazy;
use regex::Regex;

/// Keywords kept in a heuristic analysis
const MAX_KEYWORDS: usize = 5;

/// An extracted artist must be longer than this
const MIN_ARTIST_LEN: usize = 3;

/// "5 songs", "12 tracks"
static COUNT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,3})\s+(?:songs?|tracks?)\b").expect("valid regex"));

/// "10 upbeat ..."
static LEADING_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,3})\b").expect("valid regex"));

/// Ordered artist patterns: "by X", "from X", "X songs"
static ARTIST_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    const NAME: &str = r"[A-Z][\w'&.\-]*(?:\s+[A-Z][\w'&.\-]*)*";
    [
        format!(r"\bby\s+({NAME})"),
        format!(r"\bfrom\s+({NAME})"),
        format!(r"({NAME})\s+songs\b"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// "60s", "1980s", "90's"
static DECADE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b((?:19|20)?\d0)'?s\b").expect("valid regex"));

/// Build a complete analysis from the prompt text alone.
///
/// The prompt embedding is always absent on this path.
pub fn heuristic_analysis(prompt: &str) -> QueryAnalysis {
    let mut constraints = Constraints::with_counts(extract_target_count(prompt), None);
    constraints.specific_artist = extract_artist(prompt);
    constraints.decade = extract_decade(prompt);

    QueryAnalysis {
        constraints,
        search_queries: default_search_queries(prompt),
        refined_prompt: prompt.trim().to_string(),
        keywords: prompt_keywords(prompt).into_iter().take(MAX_KEYWORDS).collect(),
        original_embedding: None,
    }
}

/// Requested result count: "N songs" anywhere, else a leading integer
pub fn extract_target_count(prompt: &str) -> Option<i64> {
    COUNT_PATTERN
        .captures(prompt)
        .or_else(|| LEADING_NUMBER_PATTERN.captures(prompt))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// First artist match longer than three characters, trying patterns in order
pub fn extract_artist(prompt: &str) -> Option<String> {
    ARTIST_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures_iter(prompt)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim_end_matches(['.', ',', '\'', '-']).trim().to_string())
            .find(|name| name.chars().count() > MIN_ARTIST_LEN)
    })
}

/// Normalized decade ("60s" → "1960s")
pub fn extract_decade(prompt: &str) -> Option<String> {
    let digits = DECADE_PATTERN.captures(prompt)?.get(1)?.as_str();
    let decade = match digits.len() {
        2 if digits.starts_with(['0', '1', '2']) => format!("20{}s", digits),
        2 => format!("19{}s", digits),
        _ => format!("{}s", digits),
    };
    Some(decade)
}

pub fn default_search_queries(prompt: &str) -> Vec<String> {
    let prompt = prompt.trim();
    vec![
        format!("best {} songs", prompt),
        format!("{} playlist top tracks", prompt),
    ]
}
