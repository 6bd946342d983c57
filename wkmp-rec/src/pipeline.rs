//! Recommendation pipeline entry point
//!
//! Analyzer → source fetchers (concurrent) → fusion → catalog resolver.
//! Every collaborator failure degrades inside its stage; the only error that
//! reaches the caller is `RecommendationError::InsufficientResults`. A panic
//! in any stage is caught at the entry point and becomes an empty list.

use crate::analyzer::PromptAnalyzer;
use crate::clients::Collaborators;
use crate::config::RecConfig;
use crate::error::RecommendationError;
use crate::fusion::FusionEngine;
use crate::resolver::CatalogResolver;
use crate::sources::{AiGenerationSource, ParallelFetcher, WebSearchSource};
use crate::types::{ResolvedTrack, DEFAULT_TARGET_COUNT};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Stateless per-request pipeline; one instance serves many requests
pub struct RecommendationPipeline {
    analyzer: PromptAnalyzer,
    fetcher: ParallelFetcher,
    fusion: FusionEngine,
    resolver: CatalogResolver,
}

impl RecommendationPipeline {
    /// Wire the stages from validated configuration and collaborators
    pub fn new(config: &RecConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            completion,
            embeddings,
            web_search,
            catalog,
        } = collaborators;

        // Merge order: generated songs first, then web-mined ones
        let fetcher = ParallelFetcher::new(vec![
            Arc::new(AiGenerationSource::new(completion.clone())),
            Arc::new(WebSearchSource::new(web_search)),
        ]);

        Self {
            analyzer: PromptAnalyzer::new(completion.clone(), embeddings.clone()),
            fetcher,
            fusion: FusionEngine::new(completion, embeddings, config.pipeline.clone()),
            resolver: CatalogResolver::new(catalog, &config.pipeline),
        }
    }

    /// Produce catalog tracks for a free-text prompt.
    ///
    /// # Errors
    /// `InsufficientResults` when fusion keeps fewer songs than the request's
    /// minimum. Collaborator failures never surface here: they shrink or empty
    /// the result instead. A panic inside any stage is logged and yields an
    /// empty list.
    pub async fn generate_recommendations(
        &self,
        prompt: &str,
        access_token: &str,
    ) -> Result<Vec<ResolvedTrack>, RecommendationError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("recommendation", %request_id);

        let outcome = AssertUnwindSafe(self.run(prompt, access_token))
            .catch_unwind()
            .instrument(span)
            .await;

        match outcome {
            Ok(result) => result,
            Err(panic) => {
                error!(
                    %request_id,
                    prompt,
                    reason = panic_message(panic.as_ref()),
                    "Recommendation pipeline panicked; returning no tracks"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn run(
        &self,
        prompt: &str,
        access_token: &str,
    ) -> Result<Vec<ResolvedTrack>, RecommendationError> {
        info!(prompt, "Generating recommendations");

        let analysis = self.analyzer.analyze(prompt).await;
        let outputs = self.fetcher.fetch_all(&analysis).await;
        let fused = self.fusion.fuse(prompt, &analysis, outputs).await;

        let required = analysis.constraints.required_minimum();
        if fused.len() < required {
            warn!(found = fused.len(), required, "Too few aligned songs");
            return Err(RecommendationError::InsufficientResults {
                found: fused.len(),
                required,
            });
        }

        let target = analysis
            .constraints
            .target_count
            .unwrap_or(DEFAULT_TARGET_COUNT);
        let tracks = self.resolver.resolve_all(&fused, target, access_token).await;

        info!(
            candidates = fused.len(),
            tracks = tracks.len(),
            "Recommendations ready"
        );
        Ok(tracks)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
