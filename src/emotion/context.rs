//! Contextual emotion understanding over text embeddings.
//!
//! Every emotion is represented by the mean embedding of a handful of
//! descriptive sentences. Emotions outside the predefined set are learned
//! on first use from templated sentences and kept in a bounded cache.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::embedding::{cosine_similarity, mean_embedding, normalized_similarity, EmbeddingService};
use crate::error::{EmoRecError, Result};
use crate::models::{EmotionAnalysis, EmotionPair, EmotionType, RelatedEmotion};

/// Pairs below this cosine similarity are reported as conflicting.
pub const CONFLICT_THRESHOLD: f32 = 0.3;

/// Pairs above this cosine similarity are reported as harmonious.
pub const HARMONY_THRESHOLD: f32 = 0.7;

/// Learned emotions kept before the least recently used is dropped.
pub const MAX_LEARNED_EMOTIONS: usize = 512;

/// How a text is framed before it is compared with an emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextContext {
    /// Song title and artist.
    #[default]
    Song,
    /// A lyrics excerpt.
    Lyrics,
    /// Free text, compared as is.
    Description,
}

impl TextContext {
    fn frame(&self, text: &str) -> String {
        match self {
            TextContext::Song => format!("This song is: {}", text),
            TextContext::Lyrics => format!("Lyrics expressing emotion: {}", text),
            TextContext::Description => text.to_string(),
        }
    }
}

/// Emotion embeddings built from descriptive context.
#[derive(Debug)]
pub struct EmotionContext {
    embeddings: Arc<EmbeddingService>,
    /// Predefined emotions in declaration order.
    predefined: Vec<(String, Vec<f32>)>,
    learned: Mutex<LruCache<String, Vec<f32>>>,
}

impl EmotionContext {
    /// Embed the context sentences of every predefined emotion.
    pub async fn new(embeddings: Arc<EmbeddingService>) -> Result<Self> {
        Self::with_learned_capacity(embeddings, MAX_LEARNED_EMOTIONS).await
    }

    /// Context remembering at most `capacity` learned emotions.
    pub async fn with_learned_capacity(
        embeddings: Arc<EmbeddingService>,
        capacity: usize,
    ) -> Result<Self> {
        let mut predefined = Vec::with_capacity(EmotionType::all().len());
        for emotion in EmotionType::all() {
            let sentences = context_sentences(emotion.as_str());
            let vectors = embeddings.encode_batch(&sentences).await?;
            predefined.push((emotion.as_str().to_string(), mean_embedding(&vectors)?));
        }
        info!("Emotion context initialized with {} emotion profiles", predefined.len());

        Ok(Self {
            embeddings,
            predefined,
            learned: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        })
    }

    /// Embedding service this context encodes with.
    pub fn embeddings(&self) -> &Arc<EmbeddingService> {
        &self.embeddings
    }

    pub fn is_predefined(&self, emotion: &str) -> bool {
        let emotion = emotion.trim().to_lowercase();
        self.predefined.iter().any(|(name, _)| *name == emotion)
    }

    /// Embedding of an emotion, learning it first if it is new.
    pub async fn emotion_embedding(&self, emotion: &str) -> Result<Vec<f32>> {
        let emotion = emotion.trim().to_lowercase();
        if emotion.is_empty() {
            return Err(EmoRecError::InvalidRequest("Emotion must not be empty".to_string()));
        }

        if let Some((_, vector)) = self.predefined.iter().find(|(name, _)| *name == emotion) {
            return Ok(vector.clone());
        }

        if let Some(vector) = self.learned.lock().await.get(&emotion) {
            debug!("Using cached embedding for learned emotion '{}'", emotion);
            return Ok(vector.clone());
        }

        info!("Learning new emotion '{}'", emotion);
        let vectors = self
            .embeddings
            .encode_batch(&templated_sentences(&emotion))
            .await?;
        let vector = mean_embedding(&vectors)?;

        let related: Vec<String> = self
            .rank_predefined(&vector, &emotion)
            .into_iter()
            .take(3)
            .map(|r| r.emotion)
            .collect();
        info!("Learned emotion '{}', closest to: {}", emotion, related.join(", "));

        self.learned.lock().await.put(emotion, vector.clone());
        Ok(vector)
    }

    /// Mean of the embeddings of several emotions.
    pub async fn blend_embedding<S: AsRef<str>>(&self, emotions: &[S]) -> Result<Vec<f32>> {
        let mut vectors = Vec::with_capacity(emotions.len());
        for emotion in emotions {
            vectors.push(self.emotion_embedding(emotion.as_ref()).await?);
        }
        if vectors.is_empty() {
            return Err(EmoRecError::InvalidRequest("No emotions provided".to_string()));
        }
        mean_embedding(&vectors)
    }

    /// How well `text` matches `emotion`, from 0 to 1.
    pub async fn compute_emotion_similarity(
        &self,
        text: &str,
        emotion: &str,
        context: TextContext,
    ) -> Result<f32> {
        let scores = self
            .emotion_similarities(&[text.to_string()], &[emotion], context)
            .await?;
        Ok(scores.first().copied().unwrap_or(0.0))
    }

    /// Similarity of each text to the given emotions, averaged over emotions.
    ///
    /// Texts are encoded in one batch.
    pub async fn emotion_similarities<S: AsRef<str>>(
        &self,
        texts: &[String],
        emotions: &[S],
        context: TextContext,
    ) -> Result<Vec<f32>> {
        if emotions.is_empty() {
            return Err(EmoRecError::InvalidRequest("No emotions provided".to_string()));
        }

        let mut emotion_vectors = Vec::with_capacity(emotions.len());
        for emotion in emotions {
            emotion_vectors.push(self.emotion_embedding(emotion.as_ref()).await?);
        }

        let framed: Vec<String> = texts.iter().map(|t| context.frame(t)).collect();
        let text_vectors = self.embeddings.encode_batch(&framed).await?;

        Ok(text_vectors
            .iter()
            .map(|text| {
                let total: f32 = emotion_vectors
                    .iter()
                    .map(|emotion| normalized_similarity(text, emotion))
                    .sum();
                total / emotion_vectors.len() as f32
            })
            .collect())
    }

    /// Predefined emotions closest to `emotion`, most similar first.
    pub async fn find_related_emotions(&self, emotion: &str, top_k: usize) -> Result<Vec<RelatedEmotion>> {
        let vector = self.emotion_embedding(emotion).await?;
        let mut related = self.rank_predefined(&vector, &emotion.trim().to_lowercase());
        related.truncate(top_k);
        Ok(related)
    }

    /// Relationship between the emotions of a multi-emotion query.
    pub async fn analyze_multi_emotion_query<S: AsRef<str>>(
        &self,
        emotions: &[S],
    ) -> Result<EmotionAnalysis> {
        if emotions.is_empty() {
            return Err(EmoRecError::InvalidRequest("No emotions provided".to_string()));
        }

        let names: Vec<String> = emotions.iter().map(|e| e.as_ref().to_string()).collect();
        info!("Analyzing multi-emotion query: {:?}", names);

        let mut vectors = Vec::with_capacity(names.len());
        let mut learned_emotions = Vec::new();
        for name in &names {
            if !self.is_predefined(name) {
                learned_emotions.push(name.clone());
            }
            vectors.push(self.emotion_embedding(name).await?);
        }

        let mut conflicts = Vec::new();
        let mut harmonies = Vec::new();
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                let pair = EmotionPair {
                    first: names[i].clone(),
                    second: names[j].clone(),
                    similarity: cosine_similarity(&vectors[i], &vectors[j]),
                };
                if pair.similarity < CONFLICT_THRESHOLD {
                    conflicts.push(pair);
                } else if pair.similarity > HARMONY_THRESHOLD {
                    harmonies.push(pair);
                }
            }
        }

        let blended = mean_embedding(&vectors)?;
        let best = self
            .predefined
            .iter()
            .map(|(name, vector)| (name, cosine_similarity(&blended, vector)))
            .fold(None::<(&String, f32)>, |best, candidate| match best {
                Some(b) if b.1 >= candidate.1 => Some(b),
                _ => Some(candidate),
            });

        if !conflicts.is_empty() {
            let pairs: Vec<String> = conflicts
                .iter()
                .map(|p| format!("{}/{}", p.first, p.second))
                .collect();
            warn!("Emotion conflicts detected: {}", pairs.join(", "));
        }
        if !harmonies.is_empty() {
            let pairs: Vec<String> = harmonies
                .iter()
                .map(|p| format!("{}/{}", p.first, p.second))
                .collect();
            info!("Harmonious emotion pairs: {}", pairs.join(", "));
        }

        Ok(EmotionAnalysis {
            emotions: names,
            blended_emotion: best.map(|(name, _)| name.clone()),
            blend_confidence: best.map(|(_, score)| score).unwrap_or(0.0),
            is_coherent: conflicts.is_empty(),
            conflicts,
            harmonies,
            learned_emotions,
        })
    }

    /// Emotions learned so far, sorted.
    pub async fn learned_emotions(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .learned
            .lock()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn rank_predefined(&self, vector: &[f32], exclude: &str) -> Vec<RelatedEmotion> {
        let mut ranked: Vec<RelatedEmotion> = self
            .predefined
            .iter()
            .filter(|(name, _)| name != exclude)
            .map(|(name, other)| RelatedEmotion {
                emotion: name.clone(),
                similarity: cosine_similarity(vector, other),
            })
            .collect();
        ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        ranked
    }
}

/// Sentences describing an emotion.
fn context_sentences(emotion: &str) -> Vec<String> {
    let rich: &[&str] = match emotion {
        "happy" => &[
            "upbeat joyful cheerful music that makes you want to dance and smile",
            "bright positive songs with uplifting melodies and happy lyrics",
            "feel-good party music full of infectious energy and celebration",
            "music that radiates joy, sunshine and good vibes",
        ],
        "sad" => &[
            "emotional music about heartbreak and loss that brings tears",
            "slow somber songs with sorrowful melodies about pain and loneliness",
            "music about missing someone and feeling empty inside",
            "tearjerker ballads with emotional depth and vulnerability",
        ],
        "energetic" => &[
            "high-energy powerful music that pumps you up for action",
            "fast-paced adrenaline songs for workouts and motivation",
            "explosive tracks with driving beats and intensity",
            "music that makes you want to move, run and jump",
        ],
        "calm" => &[
            "peaceful relaxing soothing music for meditation and tranquility",
            "gentle quiet ambient sounds that help you breathe and unwind",
            "serene calming melodies for rest, sleep and stress relief",
            "soft mellow music that brings inner peace and stillness",
        ],
        "angry" => &[
            "aggressive furious music expressing rage and rebellion",
            "hard-hitting heavy songs with angry energy and distortion",
            "music channeling frustration, hatred and explosive emotions",
            "raw powerful tracks about fighting back",
        ],
        "melancholic" => &[
            "bittersweet nostalgic music tinged with sadness and longing",
            "wistful reflective songs about memories that fade away",
            "music with emotional depth expressing regret and yearning",
            "moody atmospheric tracks like autumn rain at dusk",
        ],
        "hopeful" => &[
            "inspiring uplifting music about believing in a better tomorrow",
            "optimistic songs about dreams, faith and rising above",
            "music that gives hope and belief in possibilities",
            "tracks about new beginnings and light after darkness",
        ],
        "romantic" => &[
            "intimate tender love songs about deep connection and devotion",
            "passionate romantic music expressing desire and affection",
            "soft ballads about lovers, hearts and beautiful moments",
            "music capturing warmth, closeness and being in love",
        ],
        "anxious" => &[
            "tense nervous unsettling music expressing worry and fear",
            "restless uncertain tracks with building pressure and unease",
            "music capturing stress, panic and overwhelming feelings",
            "dark suspenseful songs about doubt and nervous anticipation",
        ],
        "peaceful" => &[
            "tranquil harmonious serene music bringing balance and zen",
            "calming nature sounds of ocean breeze and gentle streams",
            "meditative tracks for mindfulness and inner stillness",
            "soothing ambient music with an atmosphere of complete peace",
        ],
        _ => &[],
    };

    if rich.is_empty() {
        templated_sentences(emotion)
    } else {
        rich.iter().map(|s| s.to_string()).collect()
    }
}

/// Generic sentences for an emotion without hand-written context.
fn templated_sentences(emotion: &str) -> Vec<String> {
    vec![
        format!("music that feels {}", emotion),
        format!("songs with {} mood and atmosphere", emotion),
        format!("{} emotional vibes and energy", emotion),
        format!("the feeling of being {}", emotion),
        format!("music that captures {} emotions", emotion),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn context() -> EmotionContext {
        EmotionContext::new(Arc::new(EmbeddingService::hashing(384)))
            .await
            .unwrap()
    }

    #[test]
    fn test_text_context_framing() {
        assert_eq!(TextContext::Song.frame("Yellow by Coldplay"), "This song is: Yellow by Coldplay");
        assert_eq!(TextContext::Lyrics.frame("la la"), "Lyrics expressing emotion: la la");
        assert_eq!(TextContext::Description.frame("rainy day"), "rainy day");
    }

    #[test]
    fn test_context_sentences_rich_and_templated() {
        assert_eq!(context_sentences("happy").len(), 4);
        let templated = context_sentences("nostalgic");
        assert_eq!(templated.len(), 5);
        assert_eq!(templated[0], "music that feels nostalgic");
    }

    #[tokio::test]
    async fn test_predefined_emotions_are_not_learned() {
        let ctx = context().await;
        ctx.emotion_embedding("Happy").await.unwrap();
        assert!(ctx.learned_emotions().await.is_empty());
        assert!(ctx.is_predefined(" SAD "));
    }

    #[tokio::test]
    async fn test_learned_emotions_are_bounded() {
        let embeddings = Arc::new(EmbeddingService::hashing(64));
        let ctx = EmotionContext::with_learned_capacity(embeddings, 2).await.unwrap();
        for emotion in ["wanderlust", "saudade", "hiraeth"] {
            ctx.emotion_embedding(emotion).await.unwrap();
        }
        assert_eq!(
            ctx.learned_emotions().await,
            vec!["hiraeth".to_string(), "saudade".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_emotion_is_learned_once() {
        let ctx = context().await;
        let first = ctx.emotion_embedding("euphoric").await.unwrap();
        let second = ctx.emotion_embedding("EUPHORIC").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.learned_emotions().await, vec!["euphoric".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_emotion_is_rejected() {
        let ctx = context().await;
        assert!(ctx.emotion_embedding("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_similarity_is_normalized() {
        let ctx = context().await;
        let score = ctx
            .compute_emotion_similarity("Happy by Pharrell Williams", "happy", TextContext::Song)
            .await
            .unwrap();
        assert!((0.0..=1.0).contains(&score));
    }

    #[tokio::test]
    async fn test_batch_similarities_match_single() {
        let ctx = context().await;
        let texts = vec!["Yellow by Coldplay".to_string(), "Creep by Radiohead".to_string()];
        let batch = ctx
            .emotion_similarities(&texts, &["sad"], TextContext::Song)
            .await
            .unwrap();
        let single = ctx
            .compute_emotion_similarity(&texts[1], "sad", TextContext::Song)
            .await
            .unwrap();
        assert_eq!(batch.len(), 2);
        assert!((batch[1] - single).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_find_related_excludes_query_and_sorts() {
        let ctx = context().await;
        let related = ctx.find_related_emotions("calm", 5).await.unwrap();
        assert_eq!(related.len(), 5);
        assert!(related.iter().all(|r| r.emotion != "calm"));
        assert!(related.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[tokio::test]
    async fn test_analyze_identical_emotions_harmonize() {
        let ctx = context().await;
        let analysis = ctx
            .analyze_multi_emotion_query(&["happy", "happy"])
            .await
            .unwrap();
        assert_eq!(analysis.harmonies.len(), 1);
        assert!(analysis.is_coherent);
        assert_eq!(analysis.blended_emotion.as_deref(), Some("happy"));
        assert!(analysis.learned_emotions.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_reports_learned_emotions() {
        let ctx = context().await;
        let analysis = ctx
            .analyze_multi_emotion_query(&["sad", "wanderlust"])
            .await
            .unwrap();
        assert_eq!(analysis.learned_emotions, vec!["wanderlust".to_string()]);
        assert_eq!(analysis.emotions.len(), 2);
        assert!(analysis.blended_emotion.is_some());
    }

    #[tokio::test]
    async fn test_analyze_empty_is_error() {
        let ctx = context().await;
        let empty: [&str; 0] = [];
        assert!(ctx.analyze_multi_emotion_query(&empty).await.is_err());
    }

    #[tokio::test]
    async fn test_blend_embedding_of_single_emotion() {
        let ctx = context().await;
        let blended = ctx.blend_embedding(&["calm"]).await.unwrap();
        assert_eq!(blended, ctx.emotion_embedding("calm").await.unwrap());
    }
}
