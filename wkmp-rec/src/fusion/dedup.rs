//! Candidate deduplication
//!
//! Two songs are duplicates when their trimmed, lowercased, 20-character
//! prefixes of title and artist match. The first occurrence wins.

use crate::types::AbstractSong;
use std::collections::HashSet;

/// Characters of each field compared for duplicate detection
const KEY_PREFIX_CHARS: usize = 20;

/// Duplicate-detection key for a song
pub fn dedupe_key(song: &AbstractSong) -> (String, String) {
    (key_part(&song.title), key_part(&song.artist))
}

fn key_part(field: &str) -> String {
    field
        .trim()
        .to_lowercase()
        .chars()
        .take(KEY_PREFIX_CHARS)
        .collect()
}

/// Drop later duplicates, keeping input order
pub fn dedupe_songs(songs: Vec<AbstractSong>) -> Vec<AbstractSong> {
    let mut seen = HashSet::with_capacity(songs.len());
    songs
        .into_iter()
        .filter(|song| seen.insert(dedupe_key(song)))
        .collect()
}
