//! Generative recommendation source
//!
//! Asks the text model directly for a structured list of songs sized to the
//! requested count.

use super::RecommendationSource;
use crate::clients::{ChatMessage, CompletionClient, CompletionOptions};
use crate::error::ClientResult;
use crate::model_output::extract_json_payload;
use crate::types::{AbstractSong, Constraints, QueryAnalysis, SongSource, DEFAULT_TARGET_COUNT};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const GENERATION_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: 0.7,
    max_tokens: 2000,
};

pub const GENERATION_SYSTEM_PROMPT: &str = "You are a music curator with encyclopedic \
knowledge of recorded music. You only recommend real, released songs that are available on \
major streaming services. Respond with a JSON array and nothing else.";

/// One element of the model's array; every field is optional on the wire
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneratedSong {
    title: String,
    artist: String,
    album: Option<String>,
    year: Option<Value>,
    genre: Option<String>,
    match_reason: Option<String>,
    cultural_impact_score: Option<Value>,
}

impl GeneratedSong {
    fn into_song(self) -> AbstractSong {
        let mut song = AbstractSong::new(self.title, self.artist, SongSource::AiGeneration)
            .with_year(self.year.as_ref().and_then(value_as_i32))
            .with_genre(self.genre);
        song.album = self.album.filter(|a| !a.trim().is_empty());
        song.reason = self.match_reason.filter(|r| !r.trim().is_empty());
        song.cultural_impact_score = self
            .cultural_impact_score
            .as_ref()
            .and_then(value_as_f64)
            .map(|score| score.clamp(0.0, 10.0));
        song
    }
}

/// Generative recommendation source
pub struct AiGenerationSource {
    client: Arc<dyn CompletionClient>,
}

impl AiGenerationSource {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecommendationSource for AiGenerationSource {
    fn name(&self) -> &'static str {
        "ai_generation"
    }

    async fn fetch(&self, analysis: &QueryAnalysis) -> ClientResult<Vec<AbstractSong>> {
        let messages = generation_messages(&analysis.refined_prompt, &analysis.constraints);
        let text = self.client.complete(&messages, GENERATION_OPTIONS).await?;
        let payload = extract_json_payload(&text)?;

        let Value::Array(items) = payload else {
            warn!("Generated recommendations were not a JSON array; ignoring");
            return Ok(Vec::new());
        };

        let songs: Vec<AbstractSong> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<GeneratedSong>(item).ok())
            .map(GeneratedSong::into_song)
            .collect();

        debug!(count = songs.len(), "Generated recommendations parsed");
        Ok(songs)
    }
}

fn generation_messages(refined_prompt: &str, constraints: &Constraints) -> Vec<ChatMessage> {
    let target = constraints.target_count.unwrap_or(DEFAULT_TARGET_COUNT);

    let mut requirements = Vec::new();
    if let Some(decade) = &constraints.decade {
        requirements.push(format!("- Songs must be from the {}", decade));
    }
    if let Some(artist) = &constraints.specific_artist {
        requirements.push(format!("- Songs must be performed by {}", artist));
    }
    if let Some(mood) = &constraints.mood {
        requirements.push(format!("- Mood: {}", mood));
    }
    let requirements = if requirements.is_empty() {
        String::new()
    } else {
        format!("\nRequirements:\n{}\n", requirements.join("\n"))
    };

    vec![
        ChatMessage::system(GENERATION_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Recommend exactly {target} songs for: \"{refined_prompt}\"\n{requirements}\n\
             Return a JSON array where each element has:\n\
             title, artist, album, year (number), genre, match_reason (one sentence), \
             cultural_impact_score (0-10)."
        )),
    ]
}

fn value_as_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().get(..4).and_then(|y| y.parse().ok()),
        _ => None,
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
