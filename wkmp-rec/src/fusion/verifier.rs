//! AI verification pass
//!
//! The generative model rates each ranked candidate against the original
//! request. Ratings are re-checked client-side: the model is asked to drop
//! weak matches itself, but its output is not trusted to have done so.

use super::dedup::dedupe_key;
use crate::clients::{ChatMessage, CompletionClient, CompletionOptions};
use crate::error::{ClientError, ClientResult};
use crate::model_output::extract_json_payload;
use crate::types::{AbstractSong, Constraints, SongSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Candidates sent for verification
pub const VERIFICATION_BATCH: usize = 10;

/// Lowest alignment score kept
pub const MIN_ALIGNMENT_SCORE: f64 = 6.0;

const VERIFICATION_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: 0.2,
    max_tokens: 1500,
};

pub const VERIFICATION_SYSTEM_PROMPT: &str = "You verify music recommendations against \
the listener's request. Rate how well each song fits and discard poor fits. Respond with a \
JSON array and nothing else.";

/// Compact form sent to the model
#[derive(Serialize)]
struct CandidateSummary<'a> {
    title: &'a str,
    artist: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    genre: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VerifiedItem {
    title: String,
    artist: String,
    alignment_score: Option<Value>,
}

/// Rate the top candidates and keep the aligned ones, at most `target` of them
pub async fn verify_candidates(
    client: &dyn CompletionClient,
    prompt: &str,
    constraints: &Constraints,
    candidates: &[AbstractSong],
    target: usize,
) -> ClientResult<Vec<AbstractSong>> {
    let batch = &candidates[..candidates.len().min(VERIFICATION_BATCH)];
    let messages = verification_messages(prompt, constraints, batch)?;

    let text = client.complete(&messages, VERIFICATION_OPTIONS).await?;
    let Value::Array(items) = extract_json_payload(&text)? else {
        return Err(ClientError::Parse(
            "verification response is not a JSON array".to_string(),
        ));
    };

    let by_key: HashMap<(String, String), &AbstractSong> =
        batch.iter().map(|song| (dedupe_key(song), song)).collect();

    let mut seen = HashSet::new();
    let mut verified = Vec::new();
    for item in items {
        let Ok(item) = serde_json::from_value::<VerifiedItem>(item) else {
            continue;
        };
        let Some(score) = item.alignment_score.as_ref().and_then(score_value) else {
            continue;
        };
        if score < MIN_ALIGNMENT_SCORE {
            continue;
        }

        let returned = AbstractSong::new(item.title, item.artist, SongSource::AiGeneration);
        let key = dedupe_key(&returned);
        let mut song = match by_key.get(&key) {
            Some(original) => (*original).clone(),
            None if returned.has_title_and_artist() => returned,
            None => continue,
        };
        song.alignment_score = Some(score);

        if let Some(artist) = &constraints.specific_artist {
            if !artist_matches(&song.artist, artist) {
                continue;
            }
        }
        // First rating of a song wins
        if !seen.insert(key) {
            continue;
        }
        verified.push(song);
    }

    debug!(
        sent = batch.len(),
        kept = verified.len(),
        "Verification complete"
    );
    verified.truncate(target);
    Ok(verified)
}

/// Either string contains the other, case-insensitive
pub fn artist_matches(candidate: &str, requested: &str) -> bool {
    let candidate = candidate.trim().to_lowercase();
    let requested = requested.trim().to_lowercase();
    if candidate.is_empty() || requested.is_empty() {
        return false;
    }
    candidate.contains(&requested) || requested.contains(&candidate)
}

fn score_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn verification_messages(
    prompt: &str,
    constraints: &Constraints,
    batch: &[AbstractSong],
) -> ClientResult<Vec<ChatMessage>> {
    let summaries: Vec<CandidateSummary<'_>> = batch
        .iter()
        .map(|song| CandidateSummary {
            title: &song.title,
            artist: &song.artist,
            year: song.year,
            genre: song.genre.as_deref(),
        })
        .collect();
    let candidates = serde_json::to_string(&summaries)
        .map_err(|e| ClientError::Parse(format!("failed to serialize candidates: {}", e)))?;

    let artist_rule = constraints
        .specific_artist
        .as_deref()
        .map(|artist| format!("Only keep songs performed by {}.\n", artist))
        .unwrap_or_default();

    Ok(vec![
        ChatMessage::system(VERIFICATION_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Request: \"{prompt}\"\n\nCandidates: {candidates}\n\n{artist_rule}\
             Give each song an alignment_score from 1 to 10 and omit songs scoring below 6.\n\
             Return a JSON array of {{\"title\", \"artist\", \"alignment_score\"}}."
        )),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeCompletion;

    fn candidates() -> Vec<AbstractSong> {
        let mut songs = vec![
            AbstractSong::new("Yesterday", "The Beatles", SongSource::AiGeneration)
                .with_year(Some(1965)),
            AbstractSong::new("Help!", "The Beatles", SongSource::WebSearch),
            AbstractSong::new("Satisfaction", "The Rolling Stones", SongSource::WebSearch),
        ];
        songs[0].basic_score = 9.0;
        songs
    }

    async fn verify(response: &str, constraints: &Constraints, target: usize) -> ClientResult<Vec<AbstractSong>> {
        let client = FakeCompletion::new().respond(VERIFICATION_SYSTEM_PROMPT, response);
        verify_candidates(&client, "60s Beatles", constraints, &candidates(), target).await
    }

    #[tokio::test]
    async fn test_low_and_missing_scores_dropped() {
        let response = r#"[
            {"title": "Yesterday", "artist": "The Beatles", "alignment_score": 9},
            {"title": "Help!", "artist": "The Beatles", "alignment_score": 5},
            {"title": "Satisfaction", "artist": "The Rolling Stones"}
        ]"#;

        let verified = verify(response, &Constraints::default(), 12).await.unwrap();

        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].title, "Yesterday");
        assert_eq!(verified[0].alignment_score, Some(9.0));
        // Matched back to the original candidate
        assert_eq!(verified[0].year, Some(1965));
        assert_eq!(verified[0].basic_score, 9.0);
    }

    #[tokio::test]
    async fn test_specific_artist_filter() {
        let response = r#"[
            {"title": "Yesterday", "artist": "the beatles", "alignment_score": 8},
            {"title": "Satisfaction", "artist": "The Rolling Stones", "alignment_score": "7"}
        ]"#;
        let constraints = Constraints {
            specific_artist: Some("Beatles".to_string()),
            ..Default::default()
        };

        let verified = verify(response, &constraints, 12).await.unwrap();

        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].artist, "The Beatles");
    }

    #[tokio::test]
    async fn test_truncated_to_target() {
        let response = r#"[
            {"title": "Yesterday", "artist": "The Beatles", "alignment_score": 9},
            {"title": "Help!", "artist": "The Beatles", "alignment_score": 8},
            {"title": "Penny Lane", "artist": "The Beatles", "alignment_score": 7}
        ]"#;

        let verified = verify(response, &Constraints::default(), 2).await.unwrap();

        assert_eq!(verified.len(), 2);
        assert_eq!(verified[1].title, "Help!");
    }

    #[tokio::test]
    async fn test_unknown_song_kept_as_new_candidate() {
        let response = r#"[{"title": "Penny Lane", "artist": "The Beatles", "alignment_score": 7.5}]"#;

        let verified = verify(response, &Constraints::default(), 12).await.unwrap();

        assert_eq!(verified[0].title, "Penny Lane");
        assert_eq!(verified[0].source, SongSource::AiGeneration);
    }

    #[tokio::test]
    async fn test_repeated_song_kept_once() {
        let response = r#"[
            {"title": "Yesterday", "artist": "The Beatles", "alignment_score": 9},
            {"title": "yesterday ", "artist": "the beatles", "alignment_score": 8},
            {"title": "Help!", "artist": "The Beatles", "alignment_score": 7}
        ]"#;

        let verified = verify(response, &Constraints::default(), 12).await.unwrap();

        let titles: Vec<&str> = verified.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Yesterday", "Help!"]);
        assert_eq!(verified[0].alignment_score, Some(9.0));
    }

    #[tokio::test]
    async fn test_unknown_song_without_artist_dropped() {
        let response = r#"[
            {"title": "Penny Lane", "artist": "", "alignment_score": 8},
            {"title": "", "artist": "The Beatles", "alignment_score": 8},
            {"title": "Help!", "artist": "The Beatles", "alignment_score": 7}
        ]"#;

        let verified = verify(response, &Constraints::default(), 12).await.unwrap();

        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].title, "Help!");
    }

    #[tokio::test]
    async fn test_non_array_is_error() {
        let result = verify(r#"{"songs": []}"#, &Constraints::default(), 12).await;
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }

    #[test]
    fn test_artist_matches_either_direction() {
        assert!(artist_matches("The Beatles", "beatles"));
        assert!(artist_matches("Beatles", "The Beatles"));
        assert!(!artist_matches("The Rolling Stones", "Beatles"));
        assert!(!artist_matches("", "Beatles"));
    }
}
