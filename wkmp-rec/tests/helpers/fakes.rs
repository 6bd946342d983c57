//! Scripted collaborator fakes

use async_trait::async_trait;
use serde_json::Map;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wkmp_rec::clients::{
    CatalogClient, CatalogSearchResponse, CatalogTrackPage, ChatMessage, Collaborators,
    CompletionClient, CompletionOptions, EmbeddingClient, WebResult, WebResults, WebSearchClient,
    WebSearchResponse,
};
use wkmp_rec::types::{CatalogArtist, CatalogTrack};
use wkmp_rec::{ClientError, ClientResult, RecConfig, RecommendationPipeline};

/// Completion responses keyed by a marker found in the system message
#[derive(Default)]
pub struct ScriptedCompletion {
    responses: HashMap<&'static str, Option<String>>,
    panics_on: Option<&'static str>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, system_prompt: &'static str, text: impl Into<String>) -> Self {
        self.responses.insert(system_prompt, Some(text.into()));
        self
    }

    pub fn fail(mut self, system_prompt: &'static str) -> Self {
        self.responses.insert(system_prompt, None);
        self
    }

    /// Panic instead of answering when this system prompt arrives
    pub fn panic_on(mut self, system_prompt: &'static str) -> Self {
        self.panics_on = Some(system_prompt);
        self
    }

    pub fn calls_for(&self, system_prompt: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| **p == system_prompt)
            .count()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: CompletionOptions,
    ) -> ClientResult<String> {
        let system = messages.first().map(|m| m.content.as_str()).unwrap_or("");
        if self.panics_on == Some(system) {
            panic!("completion backend crashed");
        }
        let Some((prompt, response)) = self.responses.iter().find(|(p, _)| **p == system) else {
            return Err(ClientError::upstream("completion", "unscripted prompt"));
        };
        self.calls.lock().unwrap().push(*prompt);
        response
            .clone()
            .ok_or_else(|| ClientError::upstream("completion", "503 Service Unavailable"))
    }
}

/// Same vector for every text, or a failure
pub struct StaticEmbeddings(pub Option<Vec<f32>>);

#[async_trait]
impl EmbeddingClient for StaticEmbeddings {
    async fn embed(&self, texts: &[String]) -> ClientResult<Vec<Vec<f32>>> {
        match &self.0 {
            Some(vector) => Ok(texts.iter().map(|_| vector.clone()).collect()),
            None => Err(ClientError::upstream("embeddings", "429 Too Many Requests")),
        }
    }
}

/// Search results keyed by exact query; unknown queries return no results
#[derive(Default)]
pub struct ScriptedWebSearch {
    results: HashMap<String, Vec<WebResult>>,
    offline: bool,
}

impl ScriptedWebSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Default::default()
        }
    }

    pub fn with_results(mut self, query: &str, results: Vec<WebResult>) -> Self {
        self.results.insert(query.to_string(), results);
        self
    }
}

#[async_trait]
impl WebSearchClient for ScriptedWebSearch {
    async fn search(&self, query: &str) -> ClientResult<WebSearchResponse> {
        if self.offline {
            return Err(ClientError::upstream("web-search", "connection refused"));
        }
        Ok(WebSearchResponse {
            web: Some(WebResults {
                results: self.results.get(query).cloned().unwrap_or_default(),
            }),
        })
    }
}

/// Catalog tracks keyed by exact query; records queries and tokens
#[derive(Default)]
pub struct ScriptedCatalog {
    tracks: HashMap<String, Vec<CatalogTrack>>,
    seen: Mutex<Vec<(String, String)>>,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(mut self, query: &str, tracks: Vec<CatalogTrack>) -> Self {
        self.tracks.insert(query.to_string(), tracks);
        self
    }

    /// `(query, access_token)` pairs in call order
    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogClient for ScriptedCatalog {
    async fn search_tracks(
        &self,
        query: &str,
        access_token: &str,
        _limit: usize,
    ) -> ClientResult<CatalogSearchResponse> {
        self.seen
            .lock()
            .unwrap()
            .push((query.to_string(), access_token.to_string()));
        Ok(CatalogSearchResponse {
            tracks: Some(CatalogTrackPage {
                items: self.tracks.get(query).cloned().unwrap_or_default(),
            }),
        })
    }
}

pub fn web_result(title: &str, description: &str) -> WebResult {
    WebResult {
        title: title.to_string(),
        description: description.to_string(),
        url: "https://example.com/list".to_string(),
    }
}

pub fn catalog_track(id: &str, name: &str, artist: &str) -> CatalogTrack {
    let mut extra = Map::new();
    extra.insert("uri".to_string(), format!("spotify:track:{}", id).into());
    CatalogTrack {
        id: id.to_string(),
        name: name.to_string(),
        artists: vec![CatalogArtist {
            name: artist.to_string(),
            extra: Map::new(),
        }],
        extra,
    }
}

/// Pipeline over the given fakes with test keys and no batch delay
pub fn pipeline_with(
    completion: Arc<ScriptedCompletion>,
    embeddings: StaticEmbeddings,
    web_search: ScriptedWebSearch,
    catalog: Arc<ScriptedCatalog>,
    configure: impl FnOnce(&mut RecConfig),
) -> RecommendationPipeline {
    let mut config = RecConfig::new("test-openai-key", "test-brave-key");
    config.pipeline.batch_delay_ms = 0;
    configure(&mut config);

    RecommendationPipeline::new(
        &config,
        Collaborators {
            completion,
            embeddings: Arc::new(embeddings),
            web_search: Arc::new(web_search),
            catalog,
        },
    )
}
