//! Web-search source
//!
//! Issues one search per analyzer query, all in flight at once with no
//! inter-call delay. Song/artist pairs are mined from result titles and
//! descriptions with two heuristic patterns; extraction is best-effort and
//! will both miss and over-match.

use super::RecommendationSource;
use crate::clients::{WebResult, WebSearchClient};
use crate::error::ClientResult;
use crate::fusion::dedup::dedupe_songs;
use crate::types::{AbstractSong, QueryAnalysis, SongSource};
use async_trait::async_trait;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Analyzer queries searched
const MAX_QUERIES: usize = 2;

/// Top results mined per query
const RESULTS_PER_QUERY: usize = 5;

/// Matches kept per pattern per result
const MAX_MATCHES_PER_PATTERN: usize = 2;

/// Extraction stops for a result once this many songs are collected
const MAX_SONGS_PER_RESULT: usize = 3;

/// Songs kept per query overall
const MAX_SONGS_PER_QUERY: usize = 8;

/// Genre assigned to every web-mined song
pub const PLACEHOLDER_GENRE: &str = "Unknown";

/// Sites that show up in the artist slot of "X - Y" titles
const SITE_NAMES: &[&str] = &[
    "youtube", "spotify", "wikipedia", "apple music", "reddit", "genius", "lyrics",
    "rolling stone", "billboard", "amazon",
];

/// `"Title" by Artist` (straight or curly quotes)
static QUOTED_BY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["“]([^"“”]{2,80})["”],?\s+by\s+([A-Z][\w'&.\-]*(?:\s+[A-Z][\w'&.\-]*){0,3})"#)
        .expect("valid regex")
});

/// `Artist - Title` with title-cased words on both sides
static DASH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z][\w'&]*(?:\s+[A-Z][\w'&]*){0,3})\s+[-–]\s+([A-Z][\w'&]*(?:\s+[A-Z][\w'&]*){0,5})")
        .expect("valid regex")
});

static YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19[5-9]\d|20[0-2]\d)\b").expect("valid regex"));

static HTML_TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Which capture group holds which field
#[derive(Clone, Copy)]
enum CaptureOrder {
    TitleThenArtist,
    ArtistThenTitle,
}

/// Web-search recommendation source
pub struct WebSearchSource {
    client: Arc<dyn WebSearchClient>,
}

impl WebSearchSource {
    pub fn new(client: Arc<dyn WebSearchClient>) -> Self {
        Self { client }
    }

    /// One query; failures and timeouts yield an empty list
    async fn search_query(&self, query: &str) -> Vec<AbstractSong> {
        match self.client.search(query).await {
            Ok(response) => {
                let songs = extract_songs_from_results(&response.into_results(), query);
                debug!(query = %query, count = songs.len(), "Songs extracted from web results");
                songs
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Web search failed for query");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl RecommendationSource for WebSearchSource {
    fn name(&self) -> &'static str {
        "web_search"
    }

    async fn fetch(&self, analysis: &QueryAnalysis) -> ClientResult<Vec<AbstractSong>> {
        let searches = analysis
            .search_queries
            .iter()
            .take(MAX_QUERIES)
            .map(|query| self.search_query(query));

        let songs: Vec<AbstractSong> = join_all(searches).await.into_iter().flatten().collect();
        Ok(dedupe_songs(songs))
    }
}

/// Mine songs from the top results of one query
pub fn extract_songs_from_results(results: &[WebResult], query: &str) -> Vec<AbstractSong> {
    let mut songs = Vec::new();

    for result in results.iter().take(RESULTS_PER_QUERY) {
        if songs.len() >= MAX_SONGS_PER_QUERY {
            break;
        }

        let text = clean_snippet(&format!("{} {}", result.title, result.description));
        let year = extract_year(&text);
        let mut from_result: Vec<AbstractSong> = Vec::new();

        'patterns: for (pattern, order) in [
            (&*QUOTED_BY_PATTERN, CaptureOrder::TitleThenArtist),
            (&*DASH_PATTERN, CaptureOrder::ArtistThenTitle),
        ] {
            for caps in pattern.captures_iter(&text).take(MAX_MATCHES_PER_PATTERN) {
                if from_result.len() >= MAX_SONGS_PER_RESULT {
                    break 'patterns;
                }
                let (Some(first), Some(second)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                let (title, artist) = match order {
                    CaptureOrder::TitleThenArtist => (first.as_str(), second.as_str()),
                    CaptureOrder::ArtistThenTitle => (second.as_str(), first.as_str()),
                };
                let title = title.trim_end_matches(['.', ',']);
                let artist = artist.trim_end_matches(['.', ',']);
                if is_site_name(artist) || is_site_name(title) {
                    continue;
                }

                from_result.push(
                    AbstractSong::new(title, artist, SongSource::WebSearch)
                        .with_year(year)
                        .with_genre(Some(PLACEHOLDER_GENRE.to_string()))
                        .with_reason(format!("Found via web search: \"{}\"", query)),
                );
            }
        }

        songs.extend(from_result);
    }

    songs.truncate(MAX_SONGS_PER_QUERY);
    songs
}

/// First 1950-2029 year mentioned in the text
pub fn extract_year(text: &str) -> Option<i32> {
    YEAR_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Strip markup and the common HTML entities search APIs leave in snippets
fn clean_snippet(text: &str) -> String {
    HTML_TAG_PATTERN
        .replace_all(text, "")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
}

fn is_site_name(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    SITE_NAMES.iter().any(|site| lower == *site)
}
