//! Spotify search query generation.
//!
//! Emotions and seed songs are compared against a small embedded vocabulary
//! of genre and mood descriptions; the closest entries become Spotify
//! search queries.

use std::sync::Arc;

use tracing::{info, warn};

use crate::embedding::{cosine_similarity, mean_embedding, song_text, EmbeddingService};
use crate::error::Result;

/// Genres below this similarity to the emotion are not searched.
pub const MIN_GENRE_SIMILARITY: f32 = 0.15;

/// Genres above this similarity get a recent-years filter.
const YEAR_FILTER_SIMILARITY: f32 = 0.25;

const GENRES: &[(&str, &str)] = &[
    ("indie", "independent alternative music with artistic creativity and emotional depth"),
    ("pop", "popular mainstream catchy accessible music with broad appeal"),
    ("rock", "guitar-driven energetic powerful music with strong rhythms"),
    ("electronic", "synthesizer electronic beats digital production modern sounds"),
    ("folk", "acoustic traditional storytelling organic natural instruments"),
    ("r&b", "rhythm and blues soul smooth vocals emotional expression"),
    ("hip-hop", "rap beats urban poetry rhythmic spoken word"),
    ("jazz", "improvisation sophisticated complex harmonies instrumental"),
    ("classical", "orchestral traditional composed instrumental sophisticated"),
    ("metal", "heavy distorted aggressive intense powerful dark"),
    ("punk", "fast raw rebellious energetic simple direct"),
    ("ambient", "atmospheric soundscape minimal relaxing textural"),
    ("soul", "emotional expressive vocals heartfelt passion"),
    ("country", "storytelling acoustic traditional americana roots"),
    ("reggae", "offbeat rhythm relaxed caribbean groove positive"),
    ("blues", "emotional guitar melancholic storytelling raw feelings"),
];

const MOODS: &[(&str, &str)] = &[
    ("uplifting", "inspiring hopeful positive bright encouraging energizing"),
    ("melancholic", "sad reflective nostalgic bittersweet wistful longing"),
    ("energetic", "active dynamic powerful intense driving exciting"),
    ("calm", "peaceful relaxing soothing gentle quiet tranquil"),
    ("dark", "moody atmospheric somber brooding intense heavy"),
    ("romantic", "loving tender intimate passionate affectionate emotional"),
    ("aggressive", "intense powerful forceful angry rebellious raw"),
    ("dreamy", "ethereal floating soft atmospheric hazy ambient"),
    ("groovy", "funky rhythmic danceable smooth moving infectious"),
    ("raw", "authentic unpolished emotional honest direct stripped"),
];

/// Builds search queries from embedded genre and mood vocabulary.
#[derive(Debug)]
pub struct SearchQueryGenerator {
    embeddings: Arc<EmbeddingService>,
    genres: Vec<(String, Vec<f32>)>,
    moods: Vec<(String, Vec<f32>)>,
}

impl SearchQueryGenerator {
    pub async fn new(embeddings: Arc<EmbeddingService>) -> Result<Self> {
        let genres = encode_vocabulary(&embeddings, GENRES).await?;
        let moods = encode_vocabulary(&embeddings, MOODS).await?;
        info!(
            "Search query generator initialized with {} genres and {} moods",
            genres.len(),
            moods.len()
        );
        Ok(Self {
            embeddings,
            genres,
            moods,
        })
    }

    /// Genres at least `min_similarity` close to `emotion`, best first.
    pub async fn filter_relevant_genres(
        &self,
        emotion: &str,
        min_similarity: f32,
        max_genres: usize,
    ) -> Result<Vec<(String, f32)>> {
        let query = self.embeddings.encode_text(&emotion_description(emotion)).await?;
        let mut relevant: Vec<(String, f32)> = rank(&query, &self.genres)
            .into_iter()
            .filter(|(_, score)| *score >= min_similarity)
            .collect();
        relevant.truncate(max_genres);

        info!(
            "Filtered to {} relevant genres for '{}': {}",
            relevant.len(),
            emotion,
            format_scores(&relevant)
        );
        Ok(relevant)
    }

    /// Search queries for an emotion.
    ///
    /// Falls back to the emotion itself as a free-text query when no
    /// genre is similar enough.
    pub async fn generate_queries_for_emotion(
        &self,
        emotion: &str,
        num_queries: usize,
        include_year: bool,
    ) -> Result<Vec<String>> {
        let top = self
            .filter_relevant_genres(emotion, MIN_GENRE_SIMILARITY, 6)
            .await?;

        if top.is_empty() {
            warn!("No genre matched '{}', searching the emotion as text", emotion);
            return Ok(vec![emotion.trim().to_string()]);
        }

        let mut queries: Vec<String> = top
            .iter()
            .take(4)
            .map(|(genre, score)| {
                if include_year && *score > YEAR_FILTER_SIMILARITY {
                    format!("genre:{} year:2015-2024", genre)
                } else {
                    format!("genre:{}", genre)
                }
            })
            .collect();

        if include_year {
            for (genre, _) in top.iter().take(2) {
                queries.push(format!("genre:{} year:2010-2024", genre));
            }
        }

        queries.truncate(num_queries);
        info!("Generated {} queries for '{}'", queries.len(), emotion);
        Ok(queries)
    }

    /// Search queries inferred from `(song, artist)` seeds.
    pub async fn generate_queries_for_seed_songs(
        &self,
        seeds: &[(String, String)],
        num_queries: usize,
    ) -> Result<Vec<String>> {
        if seeds.is_empty() {
            return Ok(Vec::new());
        }
        info!("Generating search queries from {} seed songs", seeds.len());

        let centroid = self.seed_centroid(seeds).await?;
        let top_genres = rank(&centroid, &self.genres);
        let top_moods = rank(&centroid, &self.moods);

        let mut queries: Vec<String> = top_genres
            .iter()
            .take(3)
            .map(|(genre, _)| format!("genre:{}", genre))
            .collect();

        if let Some((mood, _)) = top_moods.first() {
            for (genre, _) in top_genres.iter().take(2) {
                queries.push(format!("genre:{} {}", genre, mood));
            }
        }

        if let Some((genre, _)) = top_genres.first() {
            queries.push(format!("genre:{} year:2010-2024", genre));
        }

        queries.truncate(num_queries);
        Ok(queries)
    }

    /// Mood descriptors closest to the seeds, best first.
    pub async fn infer_emotion_from_seeds(
        &self,
        seeds: &[(String, String)],
        top_k: usize,
    ) -> Result<Vec<(String, f32)>> {
        if seeds.is_empty() {
            return Ok(Vec::new());
        }
        let centroid = self.seed_centroid(seeds).await?;
        let mut moods = rank(&centroid, &self.moods);
        moods.truncate(top_k);
        info!("Inferred moods from seeds: {}", format_scores(&moods));
        Ok(moods)
    }

    async fn seed_centroid(&self, seeds: &[(String, String)]) -> Result<Vec<f32>> {
        let texts: Vec<String> = seeds
            .iter()
            .map(|(song, artist)| song_text(song, artist))
            .collect();
        let vectors = self.embeddings.encode_batch(&texts).await?;
        mean_embedding(&vectors)
    }
}

async fn encode_vocabulary(
    embeddings: &EmbeddingService,
    entries: &[(&str, &str)],
) -> Result<Vec<(String, Vec<f32>)>> {
    let descriptions: Vec<String> = entries.iter().map(|(_, d)| d.to_string()).collect();
    let vectors = embeddings.encode_batch(&descriptions).await?;
    Ok(entries
        .iter()
        .map(|(name, _)| name.to_string())
        .zip(vectors)
        .collect())
}

fn emotion_description(emotion: &str) -> String {
    let emotion = emotion.trim();
    format!(
        "music that feels {}, songs with {} mood and emotional vibe",
        emotion, emotion
    )
}

/// Entries ranked by cosine similarity to `query`, best first.
fn rank(query: &[f32], entries: &[(String, Vec<f32>)]) -> Vec<(String, f32)> {
    let mut ranked: Vec<(String, f32)> = entries
        .iter()
        .map(|(name, vector)| (name.clone(), cosine_similarity(query, vector)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

fn format_scores(scores: &[(String, f32)]) -> String {
    scores
        .iter()
        .map(|(name, score)| format!("{}({:.2})", name, score))
        .collect::<Vec<_>>()
        .join(", ")
}
