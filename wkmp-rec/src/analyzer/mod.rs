//! Prompt Analyzer
//!
//! Turns a free-text prompt into a `QueryAnalysis`. The structured completion
//! and the prompt embedding are independent calls and run concurrently. When
//! the completion fails or returns something unparseable, the heuristic
//! fallback takes over and the embedding is discarded.

pub mod fallback;

use crate::clients::{ChatMessage, CompletionClient, CompletionOptions, EmbeddingClient};
use crate::error::ClientResult;
use crate::model_output::parse_json_payload;
use crate::types::{Constraints, QueryAnalysis};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Search queries handed to the web-search fetcher
const SEARCH_QUERY_COUNT: usize = 2;

/// Keywords kept from the structured analysis
const KEYWORD_COUNT: usize = 5;

const ANALYSIS_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: 0.3,
    max_tokens: 500,
};

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You analyze music listening requests and turn them \
into structured search parameters. Respond with a single JSON object and nothing else.";

/// Shape requested from the model; every field is optional on the wire
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnalysisPayload {
    target_count: Option<i64>,
    min_count: Option<i64>,
    decade: Option<String>,
    specific_artist: Option<String>,
    mood: Option<String>,
    search_queries: Vec<String>,
    refined_prompt: Option<String>,
    keywords: Vec<String>,
}

impl AnalysisPayload {
    fn into_analysis(self, prompt: &str, original_embedding: Option<Vec<f32>>) -> QueryAnalysis {
        let mut constraints = Constraints::with_counts(self.target_count, self.min_count);
        constraints.decade = non_blank(self.decade);
        constraints.specific_artist = non_blank(self.specific_artist);
        constraints.mood = non_blank(self.mood);

        let mut search_queries: Vec<String> = self
            .search_queries
            .into_iter()
            .filter_map(|q| non_blank(Some(q)))
            .take(SEARCH_QUERY_COUNT)
            .collect();
        if search_queries.is_empty() {
            search_queries = fallback::default_search_queries(prompt);
        }

        let mut keywords: Vec<String> = self
            .keywords
            .into_iter()
            .filter_map(|k| non_blank(Some(k)))
            .take(KEYWORD_COUNT)
            .collect();
        if keywords.is_empty() {
            keywords = prompt_keywords(prompt).into_iter().take(KEYWORD_COUNT).collect();
        }

        QueryAnalysis {
            constraints,
            search_queries,
            refined_prompt: non_blank(self.refined_prompt).unwrap_or_else(|| prompt.trim().to_string()),
            keywords,
            original_embedding,
        }
    }
}

/// Prompt Analyzer
pub struct PromptAnalyzer {
    completion: Arc<dyn CompletionClient>,
    embeddings: Arc<dyn EmbeddingClient>,
}

impl PromptAnalyzer {
    pub fn new(completion: Arc<dyn CompletionClient>, embeddings: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            completion,
            embeddings,
        }
    }

    /// Analyze a prompt. Never fails: degraded paths fall back to heuristics.
    pub async fn analyze(&self, prompt: &str) -> QueryAnalysis {
        let messages = analysis_messages(prompt);

        let (completion, embedding) = tokio::join!(
            self.completion.complete(&messages, ANALYSIS_OPTIONS),
            self.embed_prompt(prompt),
        );

        let payload: ClientResult<AnalysisPayload> =
            completion.and_then(|text| parse_json_payload(&text));

        match payload {
            Ok(payload) => {
                let analysis = payload.into_analysis(prompt, embedding);
                info!(
                    target_count = ?analysis.constraints.target_count,
                    specific_artist = ?analysis.constraints.specific_artist,
                    has_embedding = analysis.original_embedding.is_some(),
                    "Prompt analyzed"
                );
                analysis
            }
            Err(e) => {
                warn!(error = %e, "Prompt analysis failed, using heuristic fallback");
                fallback::heuristic_analysis(prompt)
            }
        }
    }

    async fn embed_prompt(&self, prompt: &str) -> Option<Vec<f32>> {
        match self.embeddings.embed(&[prompt.to_string()]).await {
            Ok(vectors) => {
                let vector = vectors.into_iter().next().filter(|v| !v.is_empty());
                debug!(dimensions = vector.as_ref().map(Vec::len), "Prompt embedded");
                vector
            }
            Err(e) => {
                warn!(error = %e, "Prompt embedding failed, semantic re-rank disabled");
                None
            }
        }
    }
}

/// Lowercased prompt words longer than two characters, in prompt order
pub fn prompt_keywords(prompt: &str) -> Vec<String> {
    prompt
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| word.chars().count() > 2)
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn analysis_messages(prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Request: \"{prompt}\"\n\n\
             Return JSON with these fields:\n\
             - target_count: number of songs requested (default 10, max 15)\n\
             - min_count: fewest songs that would still satisfy the request\n\
             - decade: decade mentioned, e.g. \"1970s\", or null\n\
             - specific_artist: artist the request is limited to, or null\n\
             - mood: dominant mood, or null\n\
             - search_queries: exactly 2 web search queries likely to surface song lists\n\
             - refined_prompt: the request rewritten as a precise recommendation brief\n\
             - keywords: 5 short keywords capturing the intent"
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeCompletion, FakeEmbeddings};

    fn analyzer(completion: FakeCompletion, embeddings: FakeEmbeddings) -> PromptAnalyzer {
        PromptAnalyzer::new(Arc::new(completion), Arc::new(embeddings))
    }

    #[test]
    fn test_prompt_keywords() {
        assert_eq!(
            prompt_keywords("70s road-trip Rock, to go!"),
            vec!["70s", "road-trip", "rock"]
        );
    }

    #[tokio::test]
    async fn test_structured_analysis_keeps_embedding() {
        let completion = FakeCompletion::new().respond(
            ANALYSIS_SYSTEM_PROMPT,
            r#"```json
            {"target_count": 8, "decade": "1970s", "mood": "energetic",
             "search_queries": ["best 70s driving rock songs", "classic rock road trip playlist", "extra"],
             "refined_prompt": "Energetic 1970s rock for driving",
             "keywords": ["70s", "rock", "road", "driving", "classic", "sixth"]}
            ```"#,
        );
        let analysis = analyzer(completion, FakeEmbeddings::Constant(vec![1.0, 0.0]))
            .analyze("70s road trip rock")
            .await;

        assert_eq!(analysis.constraints.target_count, Some(8));
        assert_eq!(analysis.constraints.min_count, Some(3));
        assert_eq!(analysis.constraints.decade.as_deref(), Some("1970s"));
        assert_eq!(analysis.constraints.specific_artist, None);
        assert_eq!(analysis.search_queries.len(), 2);
        assert_eq!(analysis.keywords.len(), 5);
        assert_eq!(analysis.refined_prompt, "Energetic 1970s rock for driving");
        assert_eq!(analysis.original_embedding, Some(vec![1.0, 0.0]));
    }

    #[tokio::test]
    async fn test_completion_failure_uses_fallback() {
        let completion = FakeCompletion::new().fail(ANALYSIS_SYSTEM_PROMPT);
        let analysis = analyzer(completion, FakeEmbeddings::Constant(vec![1.0]))
            .analyze("love songs by Adele, 4 songs")
            .await;

        assert_eq!(analysis.constraints.target_count, Some(4));
        assert_eq!(analysis.constraints.specific_artist.as_deref(), Some("Adele"));
        assert!(analysis.original_embedding.is_none());
    }

    #[tokio::test]
    async fn test_unparseable_completion_uses_fallback() {
        let completion =
            FakeCompletion::new().respond(ANALYSIS_SYSTEM_PROMPT, "I think you'd enjoy classic rock!");
        let analysis = analyzer(completion, FakeEmbeddings::Constant(vec![1.0]))
            .analyze("Bruce Springsteen songs")
            .await;

        assert_eq!(
            analysis.constraints.specific_artist.as_deref(),
            Some("Bruce Springsteen")
        );
        assert!(analysis.original_embedding.is_none());
    }

    #[tokio::test]
    async fn test_embedding_failure_keeps_structured_analysis() {
        let completion = FakeCompletion::new().respond(
            ANALYSIS_SYSTEM_PROMPT,
            r#"{"target_count": 30, "search_queries": [], "keywords": []}"#,
        );
        let analysis = analyzer(completion, FakeEmbeddings::Failing)
            .analyze("upbeat indie for running")
            .await;

        assert_eq!(analysis.constraints.target_count, Some(15));
        assert!(analysis.original_embedding.is_none());
        assert_eq!(analysis.search_queries.len(), 2);
        assert_eq!(analysis.keywords, vec!["upbeat", "indie", "for", "running"]);
        assert_eq!(analysis.refined_prompt, "upbeat indie for running");
    }
}
