//! Cheap string similarity for catalog matching
//!
//! Character-set overlap, not edit distance: the size of the intersection of
//! the two distinct-character sets divided by the larger set. Only lowercase
//! alphanumerics are compared.

use std::collections::HashSet;

/// Title weight in the combined score
pub const TITLE_WEIGHT: f64 = 0.6;

/// Artist weight in the combined score
pub const ARTIST_WEIGHT: f64 = 0.4;

fn char_set(text: &str) -> HashSet<char> {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Overlap of distinct characters in [0, 1]; 0.0 when either side is empty
pub fn char_set_similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (char_set(a), char_set(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / a.len().max(b.len()) as f64
}

/// `0.6 * title + 0.4 * best artist`
pub fn combined_score<'a>(
    wanted_title: &str,
    wanted_artist: &str,
    candidate_title: &str,
    candidate_artists: impl IntoIterator<Item = &'a str>,
) -> f64 {
    let title = char_set_similarity(wanted_title, candidate_title);
    let artist = candidate_artists
        .into_iter()
        .map(|name| char_set_similarity(wanted_artist, name))
        .fold(0.0, f64::max);
    TITLE_WEIGHT * title + ARTIST_WEIGHT * artist
}
