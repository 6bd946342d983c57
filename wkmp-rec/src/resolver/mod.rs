// Catalog Resolver
//
// Maps abstract songs to concrete catalog tracks. Songs are processed in
// sequential batches; lookups within a batch run concurrently and finish in
// any order. A fixed pause separates batches.

pub mod similarity;
pub mod strategy;

pub use strategy::SearchStrategy;

use crate::clients::CatalogClient;
use crate::config::PipelineConfig;
use crate::types::{AbstractSong, CatalogTrack, ClassicMetadata, ResolvedTrack, MAX_TARGET_COUNT};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Catalog candidates considered per query
pub const CANDIDATES_PER_QUERY: usize = 2;

/// Combined score a candidate must exceed to be accepted outright
pub const ACCEPT_THRESHOLD: f64 = 0.5;

/// Catalog Resolver
pub struct CatalogResolver {
    catalog: Arc<dyn CatalogClient>,
    batch_size: usize,
    batch_delay: Duration,
}

impl CatalogResolver {
    pub fn new(catalog: Arc<dyn CatalogClient>, settings: &PipelineConfig) -> Self {
        Self {
            catalog,
            batch_size: settings.max_concurrent_requests.max(1),
            batch_delay: settings.batch_delay(),
        }
    }

    /// Resolve up to `min(target, 15)` songs. Unresolved songs are dropped.
    ///
    /// Output follows completion order within each batch, batches in order.
    pub async fn resolve_all(
        &self,
        songs: &[AbstractSong],
        target: usize,
        access_token: &str,
    ) -> Vec<ResolvedTrack> {
        let limit = target.min(MAX_TARGET_COUNT).min(songs.len());
        let songs = &songs[..limit];
        let mut resolved = Vec::with_capacity(limit);

        for (batch_idx, batch) in songs.chunks(self.batch_size).enumerate() {
            if batch_idx > 0 {
                tokio::time::sleep(self.batch_delay).await;
            }

            let mut tasks: FuturesUnordered<_> = batch
                .iter()
                .map(|song| self.resolve_song(song, access_token))
                .collect();

            while let Some(result) = tasks.next().await {
                if let Some(track) = result {
                    resolved.push(track);
                }
            }
            debug!(batch = batch_idx, resolved = resolved.len(), "Catalog batch complete");
        }

        info!(
            requested = limit,
            resolved = resolved.len(),
            "Catalog resolution complete"
        );
        resolved
    }

    /// Try each strategy in order, stopping at the first acceptable match.
    ///
    /// When no candidate clears the threshold, the first candidate returned by
    /// any strategy is used. No candidates at all resolves to `None`.
    pub async fn resolve_song(&self, song: &AbstractSong, access_token: &str) -> Option<ResolvedTrack> {
        let mut first_seen: Option<(CatalogTrack, SearchStrategy)> = None;

        for strategy in SearchStrategy::ORDER {
            let query = strategy.query(song);
            let candidates = match self
                .catalog
                .search_tracks(&query, access_token, CANDIDATES_PER_QUERY)
                .await
            {
                Ok(response) => response.into_tracks(),
                Err(e) => {
                    warn!(
                        title = %song.title,
                        artist = %song.artist,
                        strategy = strategy.label(),
                        error = %e,
                        "Catalog search failed"
                    );
                    continue;
                }
            };

            for candidate in candidates.into_iter().take(CANDIDATES_PER_QUERY) {
                let score = similarity::combined_score(
                    &song.title,
                    &song.artist,
                    &candidate.name,
                    candidate.artists.iter().map(|a| a.name.as_str()),
                );
                if score > ACCEPT_THRESHOLD {
                    debug!(title = %song.title, score, strategy = strategy.label(), "Catalog match");
                    return Some(resolved(candidate, song, strategy));
                }
                if first_seen.is_none() {
                    first_seen = Some((candidate, strategy));
                }
            }
        }

        match first_seen {
            Some((candidate, strategy)) => {
                debug!(title = %song.title, "No confident catalog match, using first candidate");
                Some(resolved(candidate, song, strategy))
            }
            None => {
                debug!(title = %song.title, artist = %song.artist, "No catalog match");
                None
            }
        }
    }
}

fn resolved(track: CatalogTrack, song: &AbstractSong, strategy: SearchStrategy) -> ResolvedTrack {
    ResolvedTrack {
        track,
        classic_metadata: ClassicMetadata {
            song: song.clone(),
            search_strategy: strategy.label().to_string(),
        },
    }
}
