//! Local feature-hashing text embedder.
//!
//! Each lower-cased word contributes a word feature plus the character
//! trigrams of `#word#`. Features are hashed (MD5) into a fixed number of
//! signed buckets and the vector is L2-normalized, so texts sharing words
//! or word fragments land close together. No model download or network
//! access is needed.

use md5::{Digest, Md5};

/// Weight of a whole-word feature.
const WORD_WEIGHT: f32 = 1.0;

/// Weight of a character-trigram feature.
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic bag-of-features embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimensions` entries.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed one text.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokenize(text) {
            self.add_feature(&mut vector, &format!("w:{}", token), WORD_WEIGHT);

            let padded: Vec<char> = format!("#{}#", token).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut vector, &format!("c:{}", trigram), TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in vector.iter_mut() {
                *x /= norm;
            }
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Md5::digest(feature.as_bytes());
        let bucket = digest[..8]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        let index = (bucket % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[index] += sign * weight;
    }
}

/// Split text into lower-cased alphanumeric words.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn test_embedding_has_requested_dimensions() {
        let embedder = HashingEmbedder::new(384);
        assert_eq!(embedder.embed("Bohemian Rhapsody by Queen").len(), 384);
    }

    #[test]
    fn test_embedding_is_unit_length() {
        let embedder = HashingEmbedder::new(384);
        let v = embedder.embed("upbeat joyful music");
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(64);
        assert!(embedder.embed("  ...  ").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_embedding_is_deterministic_and_case_insensitive() {
        let embedder = HashingEmbedder::new(384);
        assert_eq!(embedder.embed("Happy Song"), embedder.embed("happy song"));
    }

    #[test]
    fn test_shared_words_are_closer() {
        let embedder = HashingEmbedder::new(384);
        let a = embedder.embed("happy upbeat dance song");
        let b = embedder.embed("happy upbeat dance tune");
        let c = embedder.embed("quiet rainy winter evening");

        let close = cosine_similarity(&a, &b);
        let far = cosine_similarity(&a, &c);
        assert!(close > 0.5);
        assert!(close > far);
    }
}
