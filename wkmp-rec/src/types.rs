//! Core data model for the recommendation pipeline
//!
//! Everything here is request-scoped: produced during one
//! `generate_recommendations` call and dropped (or returned) at its end.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Constants
// ============================================================================

/// Earliest release year considered plausible
pub const MIN_PLAUSIBLE_YEAR: i32 = 1950;

/// Latest release year considered plausible
pub const MAX_PLAUSIBLE_YEAR: i32 = 2024;

/// Result count when the prompt does not ask for one
pub const DEFAULT_TARGET_COUNT: usize = 10;

/// Upper bound on requested result count
pub const MAX_TARGET_COUNT: usize = 15;

/// Ceiling on the minimum acceptable result count
pub const MIN_COUNT_CEILING: usize = 3;

// ============================================================================
// Abstract songs (pre-resolution candidates)
// ============================================================================

/// Which fetcher produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SongSource {
    WebSearch,
    AiGeneration,
}

impl std::fmt::Display for SongSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SongSource::WebSearch => write!(f, "web_search"),
            SongSource::AiGeneration => write!(f, "ai_generation"),
        }
    }
}

/// A title/artist candidate before catalog lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbstractSong {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// Release year, only kept when within the plausible range
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub source: SongSource,
    /// Provenance note
    pub reason: Option<String>,
    /// 0-10, only supplied by the AI source
    pub cultural_impact_score: Option<f64>,

    /// Heuristic score assigned during fusion
    #[serde(default)]
    pub basic_score: f64,
    /// Cosine similarity to the prompt embedding
    pub similarity_score: Option<f64>,
    /// 1-10 rating from the AI verification pass
    pub alignment_score: Option<f64>,
}

impl AbstractSong {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, source: SongSource) -> Self {
        Self {
            title: title.into().trim().to_string(),
            artist: artist.into().trim().to_string(),
            album: None,
            year: None,
            genre: None,
            source,
            reason: None,
            cultural_impact_score: None,
            basic_score: 0.0,
            similarity_score: None,
            alignment_score: None,
        }
    }

    /// Set the release year, discarding implausible values
    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year.and_then(plausible_year);
        self
    }

    pub fn with_genre(mut self, genre: Option<String>) -> Self {
        self.genre = genre.filter(|g| !g.trim().is_empty());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Both title and artist are non-empty after trimming
    pub fn has_title_and_artist(&self) -> bool {
        !self.title.trim().is_empty() && !self.artist.trim().is_empty()
    }
}

/// Keep a year only when it falls in the plausible release range
pub fn plausible_year(year: i32) -> Option<i32> {
    (MIN_PLAUSIBLE_YEAR..=MAX_PLAUSIBLE_YEAR)
        .contains(&year)
        .then_some(year)
}

// ============================================================================
// Prompt analysis
// ============================================================================

/// Structured intent extracted from the prompt.
///
/// Produced once by the analyzer and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub target_count: Option<usize>,
    pub min_count: Option<usize>,
    pub decade: Option<String>,
    pub specific_artist: Option<String>,
    pub mood: Option<String>,
}

impl Constraints {
    /// Build constraints from raw counts, applying defaults and caps.
    ///
    /// Non-positive target counts fall back to the default.
    pub fn with_counts(target_count: Option<i64>, min_count: Option<i64>) -> Self {
        let target = target_count
            .filter(|n| *n > 0)
            .map(|n| (n as usize).min(MAX_TARGET_COUNT))
            .unwrap_or(DEFAULT_TARGET_COUNT);

        let min = min_count
            .filter(|n| *n > 0)
            .map(|n| (n as usize).min(target))
            .unwrap_or_else(|| target.min(MIN_COUNT_CEILING));

        Self {
            target_count: Some(target),
            min_count: Some(min),
            ..Default::default()
        }
    }

    /// Fewest aligned songs the pipeline accepts before reporting failure
    pub fn required_minimum(&self) -> usize {
        let min_count = self.min_count.unwrap_or_else(|| {
            self.target_count
                .unwrap_or(DEFAULT_TARGET_COUNT)
                .min(MIN_COUNT_CEILING)
        });
        min_count.min(MIN_COUNT_CEILING)
    }
}

/// Analyzer output consumed by every downstream stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryAnalysis {
    pub constraints: Constraints,
    pub search_queries: Vec<String>,
    pub refined_prompt: String,
    pub keywords: Vec<String>,
    /// Embedding of the original prompt; absent when the embedding call or
    /// the structured analysis failed
    pub original_embedding: Option<Vec<f32>>,
}

// ============================================================================
// Catalog records
// ============================================================================

/// Artist entry of a catalog track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogArtist {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Track record as returned by the catalog search.
///
/// Fields the pipeline does not interpret are preserved in `extra` so the
/// caller receives the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<CatalogArtist>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Back-reference from a resolved track to the candidate that found it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicMetadata {
    pub song: AbstractSong,
    pub search_strategy: String,
}

/// Output unit of the pipeline. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrack {
    #[serde(flatten)]
    pub track: CatalogTrack,
    pub classic_metadata: ClassicMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plausible_year_bounds() {
        assert_eq!(plausible_year(1950), Some(1950));
        assert_eq!(plausible_year(2024), Some(2024));
        assert_eq!(plausible_year(1949), None);
        assert_eq!(plausible_year(2025), None);
    }

    #[test]
    fn test_with_year_discards_out_of_range() {
        let song = AbstractSong::new("Song", "Artist", SongSource::WebSearch).with_year(Some(1890));
        assert_eq!(song.year, None);
    }

    #[test]
    fn test_new_trims_fields() {
        let song = AbstractSong::new("  Hey Jude ", " The Beatles", SongSource::AiGeneration);
        assert_eq!(song.title, "Hey Jude");
        assert_eq!(song.artist, "The Beatles");
        assert!(song.has_title_and_artist());
    }

    #[test]
    fn test_constraints_defaults() {
        let c = Constraints::with_counts(None, None);
        assert_eq!(c.target_count, Some(DEFAULT_TARGET_COUNT));
        assert_eq!(c.min_count, Some(3));
    }

    #[test]
    fn test_constraints_cap_and_small_target() {
        assert_eq!(Constraints::with_counts(Some(40), None).target_count, Some(15));
        let small = Constraints::with_counts(Some(2), None);
        assert_eq!(small.target_count, Some(2));
        assert_eq!(small.min_count, Some(2));
        assert_eq!(Constraints::with_counts(Some(0), None).target_count, Some(10));
    }

    #[test]
    fn test_required_minimum_capped_at_three() {
        let c = Constraints {
            target_count: Some(12),
            min_count: Some(8),
            ..Default::default()
        };
        assert_eq!(c.required_minimum(), 3);

        let c = Constraints {
            target_count: Some(2),
            min_count: Some(2),
            ..Default::default()
        };
        assert_eq!(c.required_minimum(), 2);
    }

    #[test]
    fn test_resolved_track_flattens_catalog_record() {
        let track: CatalogTrack = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "name": "Hey Jude",
            "artists": [{"name": "The Beatles", "id": "b1"}],
            "uri": "spotify:track:abc",
            "popularity": 80
        }))
        .unwrap();
        assert_eq!(track.extra["uri"], "spotify:track:abc");
        assert_eq!(track.artists[0].extra["id"], "b1");

        let resolved = ResolvedTrack {
            track,
            classic_metadata: ClassicMetadata {
                song: AbstractSong::new("Hey Jude", "The Beatles", SongSource::AiGeneration),
                search_strategy: "field_scoped".to_string(),
            },
        };
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["uri"], "spotify:track:abc");
        assert_eq!(json["classic_metadata"]["search_strategy"], "field_scoped");
    }
}
