//! Semantic re-rank against the prompt embedding

use crate::clients::EmbeddingClient;
use crate::types::AbstractSong;
use tracing::{debug, warn};

/// Cosine similarity; 0.0 for empty, mismatched or zero-length vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Text embedded for a candidate
fn candidate_text(song: &AbstractSong) -> String {
    let mut text = format!("{} {}", song.title, song.artist);
    if let Some(genre) = &song.genre {
        text.push(' ');
        text.push_str(genre);
    }
    text
}

/// Re-order candidates by similarity to the prompt embedding.
///
/// One batch embedding call. On failure, or when the vector count does not
/// match the candidate count, the input order is returned unchanged.
pub async fn rerank_by_similarity(
    embeddings: &dyn EmbeddingClient,
    prompt_embedding: &[f32],
    mut songs: Vec<AbstractSong>,
) -> Vec<AbstractSong> {
    if songs.is_empty() {
        return songs;
    }

    let texts: Vec<String> = songs.iter().map(candidate_text).collect();
    let vectors = match embeddings.embed(&texts).await {
        Ok(vectors) if vectors.len() == songs.len() => vectors,
        Ok(vectors) => {
            warn!(
                expected = songs.len(),
                received = vectors.len(),
                "Candidate embedding count mismatch, keeping heuristic order"
            );
            return songs;
        }
        Err(e) => {
            warn!(error = %e, "Candidate embedding failed, keeping heuristic order");
            return songs;
        }
    };

    for (song, vector) in songs.iter_mut().zip(&vectors) {
        song.similarity_score = Some(cosine_similarity(prompt_embedding, vector));
    }
    songs.sort_by(|a, b| {
        b.similarity_score
            .unwrap_or(0.0)
            .total_cmp(&a.similarity_score.unwrap_or(0.0))
    });

    debug!(
        top_similarity = songs[0].similarity_score,
        "Candidates re-ranked by similarity"
    );
    songs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeEmbeddings;
    use crate::types::SongSource;

    #[test]
    fn test_self_similarity_is_one() {
        let v = [0.3f32, -1.2, 4.5, 0.01];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_orthogonal_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_candidate_text_includes_genre() {
        let song = AbstractSong::new("Jolene", "Dolly Parton", SongSource::AiGeneration)
            .with_genre(Some("Country".to_string()));
        assert_eq!(candidate_text(&song), "Jolene Dolly Parton Country");
    }

    fn songs() -> Vec<AbstractSong> {
        ["Alpha", "Bravo", "Charlie"]
            .iter()
            .map(|t| AbstractSong::new(*t, "Artist", SongSource::WebSearch))
            .collect()
    }

    #[tokio::test]
    async fn test_rerank_orders_by_similarity() {
        let embeddings = FakeEmbeddings::ByKeyword(
            vec![("Charlie", vec![1.0, 0.0]), ("Bravo", vec![0.6, 0.8])],
            vec![0.0, 1.0],
        );

        let ranked = rerank_by_similarity(&embeddings, &[1.0, 0.0], songs()).await;

        let titles: Vec<&str> = ranked.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Charlie", "Bravo", "Alpha"]);
        assert_eq!(ranked[2].similarity_score, Some(0.0));
    }

    #[tokio::test]
    async fn test_rerank_failure_keeps_order() {
        let ranked = rerank_by_similarity(&FakeEmbeddings::Failing, &[1.0, 0.0], songs()).await;

        let titles: Vec<&str> = ranked.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Bravo", "Charlie"]);
        assert!(ranked.iter().all(|s| s.similarity_score.is_none()));
    }
}
