//! Heuristic candidate scoring
//!
//! Pure function of the song and the prompt keywords. Weights are tunable
//! constants, not a learned model.

use crate::types::{plausible_year, AbstractSong, SongSource};

const AI_SOURCE_BONUS: f64 = 5.0;
const WEB_SOURCE_BONUS: f64 = 2.0;
const PLAUSIBLE_YEAR_BONUS: f64 = 2.0;
const CULTURAL_IMPACT_BONUS: f64 = 3.0;
const CULTURAL_IMPACT_THRESHOLD: f64 = 6.0;
const SHORT_FIELD_PENALTY: f64 = 3.0;

/// Fields shorter than this (after trimming) count as missing
const MIN_FIELD_CHARS: usize = 2;

/// Score one candidate. `keywords` are lowercase prompt words.
pub fn basic_score(song: &AbstractSong, keywords: &[String]) -> f64 {
    let mut score = match song.source {
        SongSource::AiGeneration => AI_SOURCE_BONUS,
        SongSource::WebSearch => WEB_SOURCE_BONUS,
    };

    if song.year.and_then(plausible_year).is_some() {
        score += PLAUSIBLE_YEAR_BONUS;
    }

    if song
        .cultural_impact_score
        .is_some_and(|s| s >= CULTURAL_IMPACT_THRESHOLD)
    {
        score += CULTURAL_IMPACT_BONUS;
    }

    let haystack = format!("{} {}", song.title, song.artist).to_lowercase();
    score += keywords
        .iter()
        .filter(|k| k.chars().count() > 2 && haystack.contains(k.as_str()))
        .count() as f64;

    if is_short(&song.title) {
        score -= SHORT_FIELD_PENALTY;
    }
    if is_short(&song.artist) {
        score -= SHORT_FIELD_PENALTY;
    }

    score
}

fn is_short(field: &str) -> bool {
    field.trim().chars().count() < MIN_FIELD_CHARS
}

/// Score, sort descending (stable), keep the top `limit`
pub fn score_and_rank(
    mut songs: Vec<AbstractSong>,
    keywords: &[String],
    limit: usize,
) -> Vec<AbstractSong> {
    for song in &mut songs {
        song.basic_score = basic_score(song, keywords);
    }
    songs.sort_by(|a, b| b.basic_score.total_cmp(&a.basic_score));
    songs.truncate(limit);
    songs
}
