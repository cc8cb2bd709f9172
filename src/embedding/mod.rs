//! Text embeddings and vector similarity.
//!
//! [`EmbeddingService`] turns song metadata and emotion descriptions into
//! vectors; the free functions here compare and combine those vectors.

pub mod hashing;
pub mod remote;

use std::collections::HashMap;
use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{EmbeddingConfig, EmbeddingProvider};
use crate::error::{EmoRecError, Result};

pub use hashing::HashingEmbedder;
pub use remote::RemoteEmbedder;

/// Texts cached per service.
const MAX_CACHE_ENTRIES: usize = 10_000;

/// A text-embedding backend.
#[derive(Debug, Clone)]
pub enum Embedder {
    Hashing(HashingEmbedder),
    Remote(RemoteEmbedder),
}

impl Embedder {
    /// Build the backend selected in configuration.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        match config.provider {
            EmbeddingProvider::Hashing => {
                Ok(Embedder::Hashing(HashingEmbedder::new(config.dimensions)))
            }
            EmbeddingProvider::OpenAi => Ok(Embedder::Remote(RemoteEmbedder::new(config)?)),
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            Embedder::Hashing(h) => Ok(texts.iter().map(|t| h.embed(t)).collect()),
            Embedder::Remote(r) => r.embed_batch(texts).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Embedder::Hashing(_) => "hashing",
            Embedder::Remote(_) => "openai-compatible",
        }
    }
}

/// Embedding service with a bounded per-text cache.
#[derive(Debug)]
pub struct EmbeddingService {
    embedder: Embedder,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl EmbeddingService {
    pub fn new(embedder: Embedder) -> Self {
        Self::with_capacity(embedder, MAX_CACHE_ENTRIES)
    }

    /// Service caching at most `capacity` texts, least recently used first out.
    pub fn with_capacity(embedder: Embedder, capacity: usize) -> Self {
        info!(
            "Embedding service initialized ({} backend, cache {})",
            embedder.name(),
            capacity
        );
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            embedder,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Service backed by the local hashing embedder.
    pub fn hashing(dimensions: usize) -> Self {
        Self::new(Embedder::Hashing(HashingEmbedder::new(dimensions)))
    }

    /// Embed one text.
    pub async fn encode_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.encode_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmoRecError::EmbeddingError("Empty embedding batch".to_string()))
    }

    /// Embed several texts, reusing cached vectors.
    ///
    /// Results are assembled from the cache hits taken up front plus the
    /// freshly embedded vectors, so evictions never lose part of a batch.
    pub async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut resolved: Vec<Option<Vec<f32>>> = {
            let mut cache = self.cache.lock().await;
            texts.iter().map(|t| cache.get(t).cloned()).collect()
        };

        let mut missing: Vec<String> = texts
            .iter()
            .zip(&resolved)
            .filter(|(_, hit)| hit.is_none())
            .map(|(t, _)| t.clone())
            .collect();
        missing.sort();
        missing.dedup();

        if !missing.is_empty() {
            debug!("Encoding {} new texts", missing.len());
            let vectors = self.embedder.embed_batch(&missing).await?;
            if vectors.len() != missing.len() {
                return Err(EmoRecError::EmbeddingError(format!(
                    "Expected {} embeddings, got {}",
                    missing.len(),
                    vectors.len()
                )));
            }
            let fresh: HashMap<String, Vec<f32>> = missing.into_iter().zip(vectors).collect();

            {
                let mut cache = self.cache.lock().await;
                for (text, vector) in &fresh {
                    cache.put(text.clone(), vector.clone());
                }
            }

            for (slot, text) in resolved.iter_mut().zip(texts) {
                if slot.is_none() {
                    *slot = fresh.get(text).cloned();
                }
            }
        }

        resolved
            .into_iter()
            .zip(texts)
            .map(|(vector, t)| {
                vector.ok_or_else(|| EmoRecError::EmbeddingError(format!("No embedding for '{}'", t)))
            })
            .collect()
    }

    /// Embed a song as `"{song} by {artist}"`.
    pub async fn encode_song(&self, song_name: &str, artist: &str) -> Result<Vec<f32>> {
        self.encode_text(&song_text(song_name, artist)).await
    }

    /// Vector width, measured on the backend.
    pub async fn dimension(&self) -> Result<usize> {
        Ok(self.encode_text("dimension check").await?.len())
    }
}

/// Canonical text for a song.
pub fn song_text(song_name: &str, artist: &str) -> String {
    format!("{} by {}", song_name, artist)
}

/// Cosine similarity; 0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Cosine similarity mapped from [-1, 1] onto [0, 1].
pub fn normalized_similarity(a: &[f32], b: &[f32]) -> f32 {
    ((cosine_similarity(a, b) + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Similarity of `query` against every candidate, normalized to [0, 1].
pub fn batch_similarity(query: &[f32], candidates: &[Vec<f32>]) -> Vec<f32> {
    candidates
        .iter()
        .map(|c| normalized_similarity(query, c))
        .collect()
}

/// Element-wise mean of equally sized vectors.
pub fn mean_embedding(embeddings: &[Vec<f32>]) -> Result<Vec<f32>> {
    let weights = vec![1.0; embeddings.len()];
    weighted_sum(embeddings, &weights)
}

/// Weighted average of embeddings, L2-normalized.
///
/// With no weights every embedding counts equally.
pub fn combine_embeddings(embeddings: &[Vec<f32>], weights: Option<&[f32]>) -> Result<Vec<f32>> {
    let weights = match weights {
        Some(w) if w.len() != embeddings.len() => {
            return Err(EmoRecError::EmbeddingError(format!(
                "{} weights for {} embeddings",
                w.len(),
                embeddings.len()
            )));
        }
        Some(w) => w.to_vec(),
        None => vec![1.0; embeddings.len()],
    };

    let mut combined = weighted_sum(embeddings, &weights)?;
    let norm = combined.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in combined.iter_mut() {
            *x /= norm;
        }
    }
    Ok(combined)
}

fn weighted_sum(embeddings: &[Vec<f32>], weights: &[f32]) -> Result<Vec<f32>> {
    let first = embeddings
        .first()
        .ok_or_else(|| EmoRecError::EmbeddingError("No embeddings to combine".to_string()))?;
    let dim = first.len();
    if embeddings.iter().any(|e| e.len() != dim) {
        return Err(EmoRecError::EmbeddingError(
            "Embeddings have mismatched dimensions".to_string(),
        ));
    }

    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        return Err(EmoRecError::EmbeddingError(
            "Embedding weights must sum to a positive value".to_string(),
        ));
    }

    let mut sum = vec![0.0f32; dim];
    for (embedding, weight) in embeddings.iter().zip(weights) {
        for (acc, x) in sum.iter_mut().zip(embedding) {
            *acc += x * weight;
        }
    }
    for x in sum.iter_mut() {
        *x /= total;
    }
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_normalized_similarity_range() {
        assert!((normalized_similarity(&[1.0, 0.0], &[-1.0, 0.0])).abs() < 1e-6);
        assert!((normalized_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((normalized_similarity(&[1.0, 0.0], &[0.0, 1.0]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_combine_embeddings_weighted() {
        let combined =
            combine_embeddings(&[vec![1.0, 0.0], vec![0.0, 1.0]], Some(&[3.0, 1.0])).unwrap();
        let norm = combined.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!(combined[0] > combined[1]);
    }

    #[test]
    fn test_combine_embeddings_errors() {
        assert!(combine_embeddings(&[], None).is_err());
        assert!(combine_embeddings(&[vec![1.0], vec![1.0, 2.0]], None).is_err());
        assert!(combine_embeddings(&[vec![1.0]], Some(&[1.0, 2.0])).is_err());
    }

    #[test]
    fn test_mean_embedding() {
        let mean = mean_embedding(&[vec![1.0, 3.0], vec![3.0, 5.0]]).unwrap();
        assert_eq!(mean, vec![2.0, 4.0]);
    }

    #[test]
    fn test_batch_similarity_preserves_order() {
        let scores = batch_similarity(&[1.0, 0.0], &[vec![1.0, 0.0], vec![-1.0, 0.0]]);
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > scores[1]);
    }

    #[tokio::test]
    async fn test_service_encodes_song_and_caches() {
        let service = EmbeddingService::hashing(384);
        let first = service.encode_song("Bohemian Rhapsody", "Queen").await.unwrap();
        let second = service.encode_text("Bohemian Rhapsody by Queen").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(service.dimension().await.unwrap(), 384);
    }

    #[test]
    fn test_encode_batch_with_duplicates() {
        let service = EmbeddingService::hashing(32);
        let texts = vec!["calm".to_string(), "calm".to_string(), "angry".to_string()];
        let vectors = tokio_test::block_on(service.encode_batch(&texts)).unwrap();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0], vectors[1]);
    }

    #[tokio::test]
    async fn test_encode_batch_survives_eviction() {
        let service = EmbeddingService::with_capacity(Embedder::Hashing(HashingEmbedder::new(16)), 3);
        let warm: Vec<String> = (0..3).map(|i| format!("filler {}", i)).collect();
        service.encode_batch(&warm).await.unwrap();

        let texts = vec!["filler 0".to_string(), "new a".to_string(), "new b".to_string()];
        let vectors = service.encode_batch(&texts).await.unwrap();

        let direct = HashingEmbedder::new(16);
        assert_eq!(vectors.len(), 3);
        for (text, vector) in texts.iter().zip(&vectors) {
            assert_eq!(vector, &direct.embed(text));
        }
        assert_eq!(service.cache.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn test_cache_evicts_least_recently_used() {
        let service = EmbeddingService::with_capacity(Embedder::Hashing(HashingEmbedder::new(8)), 2);
        service.encode_text("first").await.unwrap();
        service.encode_text("second").await.unwrap();
        service.encode_text("first").await.unwrap();
        service.encode_text("third").await.unwrap();

        let mut cache = service.cache.lock().await;
        assert!(cache.get("first").is_some());
        assert!(cache.get("second").is_none());
        assert!(cache.get("third").is_some());
    }
}
