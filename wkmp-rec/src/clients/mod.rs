//! External collaborator adapters
//!
//! Each collaborator is a trait so the pipeline can run against in-memory
//! fakes in tests. The reqwest implementations enforce a per-call timeout and
//! normalize every failure into `ClientError`.

pub mod brave_client;
pub mod openai_client;
pub mod spotify_client;

pub use brave_client::BraveSearchClient;
pub use openai_client::OpenAiClient;
pub use spotify_client::SpotifyCatalogClient;

use crate::config::RecConfig;
use crate::error::ClientResult;
use crate::types::CatalogTrack;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// User agent sent to every collaborator
pub(crate) const USER_AGENT: &str = concat!("WKMP-Rec/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Generative completion
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Sampling options for one completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// `(messages, temperature, maxTokens) -> text`
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> ClientResult<String>;
}

// ============================================================================
// Embeddings
// ============================================================================

/// `texts -> vectors`, one vector per input text, same order
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, texts: &[String]) -> ClientResult<Vec<Vec<f32>>>;
}

// ============================================================================
// Web search
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSearchResponse {
    #[serde(default)]
    pub web: Option<WebResults>,
}

impl WebSearchResponse {
    /// Result list, empty when the response had no `web` section
    pub fn into_results(self) -> Vec<WebResult> {
        self.web.map(|w| w.results).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebResults {
    #[serde(default)]
    pub results: Vec<WebResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
}

#[async_trait]
pub trait WebSearchClient: Send + Sync {
    async fn search(&self, query: &str) -> ClientResult<WebSearchResponse>;
}

// ============================================================================
// Catalog search
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSearchResponse {
    #[serde(default)]
    pub tracks: Option<CatalogTrackPage>,
}

impl CatalogSearchResponse {
    pub fn into_tracks(self) -> Vec<CatalogTrack> {
        self.tracks.map(|page| page.items).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrackPage {
    #[serde(default)]
    pub items: Vec<CatalogTrack>,
}

/// `(query, token) -> tracks`. The token is the caller's opaque bearer string.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search_tracks(
        &self,
        query: &str,
        access_token: &str,
        limit: usize,
    ) -> ClientResult<CatalogSearchResponse>;
}

// ============================================================================
// Bundle
// ============================================================================

/// The four collaborators the pipeline consumes
#[derive(Clone)]
pub struct Collaborators {
    pub completion: Arc<dyn CompletionClient>,
    pub embeddings: Arc<dyn EmbeddingClient>,
    pub web_search: Arc<dyn WebSearchClient>,
    pub catalog: Arc<dyn CatalogClient>,
}

impl Collaborators {
    /// Build the reqwest-backed adapters from validated configuration
    pub fn from_config(config: &RecConfig) -> ClientResult<Self> {
        let openai = Arc::new(OpenAiClient::new(config)?);
        Ok(Self {
            completion: openai.clone(),
            embeddings: openai,
            web_search: Arc::new(BraveSearchClient::new(config)?),
            catalog: Arc::new(SpotifyCatalogClient::new(config)?),
        })
    }
}
