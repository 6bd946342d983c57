// Fusion & Ranking Engine
//
// Reduces the union of all source outputs to a verified, ranked list no
// longer than the requested count. Steps run strictly in order:
// merge + dedupe, basic scoring, semantic re-rank, AI verification.

pub mod dedup;
pub mod scoring;
pub mod semantic;
pub mod verifier;

use crate::analyzer::prompt_keywords;
use crate::clients::{CompletionClient, EmbeddingClient};
use crate::config::PipelineConfig;
use crate::sources::SourceOutput;
use crate::types::{AbstractSong, QueryAnalysis};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result count when the constraints carry none
pub const DEFAULT_FUSION_TARGET: usize = 12;

/// Fusion & Ranking Engine
pub struct FusionEngine {
    completion: Arc<dyn CompletionClient>,
    embeddings: Arc<dyn EmbeddingClient>,
    settings: PipelineConfig,
}

impl FusionEngine {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        embeddings: Arc<dyn EmbeddingClient>,
        settings: PipelineConfig,
    ) -> Self {
        Self {
            completion,
            embeddings,
            settings,
        }
    }

    /// Fuse source outputs into the final candidate list
    ///
    /// # Arguments
    /// * `prompt` - Original user prompt (keywords and verification context)
    /// * `analysis` - Analyzer output (constraints, prompt embedding)
    /// * `outputs` - Source outputs, merged in the given order
    pub async fn fuse(
        &self,
        prompt: &str,
        analysis: &QueryAnalysis,
        outputs: Vec<SourceOutput>,
    ) -> Vec<AbstractSong> {
        let target = analysis
            .constraints
            .target_count
            .unwrap_or(DEFAULT_FUSION_TARGET);

        // 1. Merge + dedupe
        let merged = dedup::dedupe_songs(
            outputs
                .into_iter()
                .flat_map(|output| output.songs)
                .collect(),
        );
        debug!(merged = merged.len(), "Source outputs merged");

        // 2. Basic scoring
        let keywords = prompt_keywords(prompt);
        let mut ranked = scoring::score_and_rank(
            merged.clone(),
            &keywords,
            self.settings.max_candidates_for_embedding,
        );

        if !self.settings.verification_enabled() {
            ranked.retain(AbstractSong::has_title_and_artist);
            ranked.truncate(target);
            info!(count = ranked.len(), "Fast mode: returning heuristic ranking");
            return ranked;
        }

        // 3. Semantic re-rank
        if self.settings.semantic_rerank_enabled() {
            if let Some(prompt_embedding) = &analysis.original_embedding {
                ranked = semantic::rerank_by_similarity(
                    self.embeddings.as_ref(),
                    prompt_embedding,
                    ranked,
                )
                .await;
            }
        }

        // 4. AI verification
        match verifier::verify_candidates(
            self.completion.as_ref(),
            prompt,
            &analysis.constraints,
            &ranked,
            target,
        )
        .await
        {
            Ok(verified) => {
                info!(
                    candidates = ranked.len(),
                    verified = verified.len(),
                    "Fusion complete"
                );
                verified
            }
            // 5. Failure fallback
            Err(e) => {
                warn!(error = %e, "Verification failed, returning unscored merge");
                unverified_fallback(merged, target)
            }
        }
    }
}

/// Top `target` of the merged list with title and artist present, merge order
pub fn unverified_fallback(merged: Vec<AbstractSong>, target: usize) -> Vec<AbstractSong> {
    merged
        .into_iter()
        .filter(AbstractSong::has_title_and_artist)
        .take(target)
        .collect()
}
