//! Source Fetchers
//!
//! Independent recommendation sources run concurrently:
//! 1. **ai_generation** - asks the text model for a structured song list
//! 2. **web_search** - mines song/artist pairs from web-search snippets
//!
//! # Parallel Execution
//! All sources run independently and are joined with wait-for-all semantics.
//! A failed source contributes an empty list; it never fails the join or
//! blocks its sibling.

pub mod ai_generation;
pub mod web_search;

pub use ai_generation::AiGenerationSource;
pub use web_search::WebSearchSource;

use crate::error::ClientResult;
use crate::types::{AbstractSong, QueryAnalysis};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// A recommendation source; all fetchers implement this
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    /// Source identifier for logging (e.g., "web_search")
    fn name(&self) -> &'static str;

    /// Produce candidate songs for an analyzed prompt
    ///
    /// # Errors
    /// Returns `ClientError` if the source failed as a whole (logged and
    /// replaced by an empty list by `ParallelFetcher`)
    async fn fetch(&self, analysis: &QueryAnalysis) -> ClientResult<Vec<AbstractSong>>;
}

/// Output of one source
#[derive(Debug, Clone)]
pub struct SourceOutput {
    pub source_name: &'static str,
    pub songs: Vec<AbstractSong>,
}

/// Parallel source executor
pub struct ParallelFetcher {
    sources: Vec<Arc<dyn RecommendationSource>>,
}

impl ParallelFetcher {
    /// Sources are joined in the given order; fusion merges in that order
    pub fn new(sources: Vec<Arc<dyn RecommendationSource>>) -> Self {
        Self { sources }
    }

    /// Fetch from all sources concurrently.
    ///
    /// Returns one output per source, in source order. Failed sources yield
    /// an empty song list.
    pub async fn fetch_all(&self, analysis: &QueryAnalysis) -> Vec<SourceOutput> {
        let futures = self.sources.iter().map(|source| async move {
            let name = source.name();
            let songs = match source.fetch(analysis).await {
                Ok(songs) => {
                    debug!(source = name, count = songs.len(), "Source fetch complete");
                    songs
                }
                Err(e) => {
                    warn!(source = name, error = %e, "Source fetch failed (continuing without it)");
                    Vec::new()
                }
            };
            SourceOutput {
                source_name: name,
                songs,
            }
        });

        join_all(futures).await
    }

    pub fn count(&self) -> usize {
        self.sources.len()
    }
}
