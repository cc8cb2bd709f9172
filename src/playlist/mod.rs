//! Playlist generation.
//!
//! Seeds and emotions are turned into a combined query embedding,
//! candidates are gathered from Spotify search (or the built-in catalogue),
//! then ranked by embedding similarity and optionally by lyrics.

pub mod catalogue;

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::genius::batch_key;
use crate::api::{GeniusApi, SpotifyApi};
use crate::embedding::{
    combine_embeddings, mean_embedding, normalized_similarity, song_text, EmbeddingService,
};
use crate::emotion::{EmotionContext, EmotionMapper, TextContext};
use crate::error::{EmoRecError, Result};
use crate::models::{FeatureRanges, LyricsProfile, PlaylistRequest, SongResult, SpotifyTrackInfo};
use crate::search::SearchQueryGenerator;

/// Share of the combined embedding given to seeds when emotions are present.
const SEED_WEIGHT: f32 = 0.7;

/// Share of the combined embedding given to emotions when seeds are present.
const EMOTION_WEIGHT: f32 = 0.3;

/// Weights of seed and emotion scores when both are present.
const SEED_SCORE_WEIGHT: f64 = 0.6;
const EMOTION_SCORE_WEIGHT: f64 = 0.4;

/// Weights within the emotion score.
const CONTEXTUAL_WEIGHT: f64 = 0.7;
const TITLE_WEIGHT: f64 = 0.3;

/// Share of the final score taken by the lyrics match.
const LYRICS_WEIGHT: f64 = 0.25;

/// Most candidates sent to Genius per request.
const MAX_LYRICS_CANDIDATES: usize = 30;

/// Top tracks taken per seed artist.
const ARTIST_TOP_TRACKS: usize = 5;

const RESULTS_PER_QUERY: u32 = 20;
const EMOTION_QUERIES: usize = 6;
const SEED_QUERIES: usize = 7;
const LYRICS_CONCURRENCY: usize = 3;

/// A generated playlist with the vectors and ranges behind it.
#[derive(Debug, Clone)]
pub struct PlaylistOutcome {
    pub playlist: Vec<SongResult>,
    pub combined_embedding: Vec<f32>,
    pub emotion_features: Option<FeatureRanges>,
}

/// Seeds after Spotify resolution.
#[derive(Debug, Default)]
struct Seeds {
    /// `(song, artist)` per resolved or literal seed song.
    songs: Vec<(String, String)>,
    /// Seed artist names, used for `artist:` queries.
    artists: Vec<String>,
    /// Spotify IDs of seed tracks, excluded from results.
    track_ids: HashSet<String>,
}

impl Seeds {
    fn is_empty(&self) -> bool {
        self.songs.is_empty() && self.artists.is_empty()
    }

    fn texts(&self) -> Vec<String> {
        let mut texts: Vec<String> = self
            .songs
            .iter()
            .map(|(song, artist)| song_text(song, artist))
            .collect();
        // artists without resolved tracks still count through their name
        if self.songs.is_empty() {
            texts.extend(self.artists.iter().cloned());
        }
        texts
    }

    fn contains(&self, track: &SpotifyTrackInfo) -> bool {
        if !track.spotify_id.is_empty() && self.track_ids.contains(&track.spotify_id) {
            return true;
        }
        self.songs.iter().any(|(song, artist)| {
            song.eq_ignore_ascii_case(&track.song_name)
                && artist.eq_ignore_ascii_case(track.primary_artist())
        })
    }
}

/// A candidate track and its running score.
#[derive(Debug, Clone)]
struct Scored {
    track: SpotifyTrackInfo,
    score: f64,
    lyrics: Option<LyricsProfile>,
}

/// Ranks songs against seeds and emotions.
#[derive(Debug, Clone)]
pub struct PlaylistGenerator {
    embeddings: Arc<EmbeddingService>,
    mapper: Arc<EmotionMapper>,
    context: Arc<EmotionContext>,
    queries: Arc<SearchQueryGenerator>,
    spotify: Option<SpotifyApi>,
    genius: Option<GeniusApi>,
}

impl PlaylistGenerator {
    pub fn new(
        embeddings: Arc<EmbeddingService>,
        mapper: Arc<EmotionMapper>,
        context: Arc<EmotionContext>,
        queries: Arc<SearchQueryGenerator>,
    ) -> Self {
        Self {
            embeddings,
            mapper,
            context,
            queries,
            spotify: None,
            genius: None,
        }
    }

    /// Search candidates and resolve seeds through Spotify.
    pub fn with_spotify(mut self, spotify: Option<SpotifyApi>) -> Self {
        self.spotify = spotify;
        self
    }

    /// Re-rank candidates by their lyrics.
    pub fn with_genius(mut self, genius: Option<GeniusApi>) -> Self {
        self.genius = genius;
        self
    }

    /// Generate a playlist for a request.
    pub async fn generate(&self, request: &PlaylistRequest) -> Result<PlaylistOutcome> {
        request.validate()?;
        let emotions = request.normalized_emotions();

        info!(
            "Generating playlist: {} songs, {} artists, emotions {:?}",
            request.seed_songs().len(),
            request.seed_artists().len(),
            emotions
        );

        let seeds = self.resolve_seeds(request).await;
        if seeds.is_empty() && emotions.is_empty() {
            return Err(EmoRecError::InvalidRequest(
                "No usable seed songs, artists or emotions".to_string(),
            ));
        }

        let seed_vectors = if seeds.is_empty() {
            Vec::new()
        } else {
            self.embeddings.encode_batch(&seeds.texts()).await?
        };
        let emotion_vector = if emotions.is_empty() {
            None
        } else {
            Some(self.context.blend_embedding(&emotions).await?)
        };
        let combined_embedding = combine(&seed_vectors, emotion_vector.as_deref())?;

        let emotion_features = if emotions.is_empty() {
            None
        } else {
            if emotions.len() > 1 {
                match self.context.analyze_multi_emotion_query(&emotions).await {
                    Ok(analysis) if !analysis.is_coherent => warn!(
                        "Conflicting emotions requested, blend closest to {:?}",
                        analysis.blended_emotion
                    ),
                    Ok(_) => {}
                    Err(e) => warn!("Multi-emotion analysis failed: {}", e),
                }
            }
            Some(self.mapper.get_feature_ranges(&emotions))
        };

        let candidates = self.gather_candidates(&seeds, &emotions).await?;
        let seed_centroid = if seed_vectors.is_empty() {
            None
        } else {
            Some(mean_embedding(&seed_vectors)?)
        };

        let mut scored = self
            .score_candidates(candidates, seed_centroid.as_deref(), &emotions, emotion_vector.as_deref())
            .await?;

        if request.enrich_with_lyrics && !emotions.is_empty() {
            self.enrich_with_lyrics(&mut scored, &emotions[0], request.num_results as usize)
                .await;
        }

        scored.truncate(request.num_results as usize);
        let playlist: Vec<SongResult> = scored.into_iter().map(to_song_result).collect();

        info!("Generated playlist with {} songs", playlist.len());
        Ok(PlaylistOutcome {
            playlist,
            combined_embedding,
            emotion_features,
        })
    }

    /// Resolve seed songs and artists, falling back to their literal text.
    async fn resolve_seeds(&self, request: &PlaylistRequest) -> Seeds {
        let mut seeds = Seeds::default();

        for song in request.seed_songs() {
            if song.song_name.trim().is_empty() {
                continue;
            }
            match self.resolve_song(&song.song_name, &song.artist, song.spotify_id.as_deref()).await {
                Some(track) => {
                    seeds.songs.push((track.song_name.clone(), track.primary_artist().to_string()));
                    seeds.track_ids.insert(track.spotify_id);
                }
                None => seeds.songs.push((song.song_name.clone(), song.artist.clone())),
            }
        }

        for artist in request.seed_artists() {
            if artist.artist_name.trim().is_empty() && artist.spotify_id.is_none() {
                continue;
            }
            seeds.artists.push(artist.artist_name.clone());
            for track in self
                .resolve_artist_tracks(&artist.artist_name, artist.spotify_id.as_deref())
                .await
            {
                seeds.songs.push((track.song_name.clone(), track.primary_artist().to_string()));
                seeds.track_ids.insert(track.spotify_id);
            }
        }

        debug!(
            "Resolved {} seed songs and {} seed artists",
            seeds.songs.len(),
            seeds.artists.len()
        );
        seeds
    }

    async fn resolve_song(
        &self,
        song_name: &str,
        artist: &str,
        spotify_id: Option<&str>,
    ) -> Option<SpotifyTrackInfo> {
        let spotify = self.spotify.as_ref()?;

        let result = match spotify_id.filter(|id| !id.is_empty()) {
            Some(id) => spotify.get_track(id).await.map(Some),
            None => spotify.search_track(song_name, Some(artist)).await,
        };
        match result {
            Ok(track) => track,
            Err(e) => {
                warn!("Could not resolve seed song '{}' by '{}': {}", song_name, artist, e);
                None
            }
        }
    }

    async fn resolve_artist_tracks(
        &self,
        artist_name: &str,
        spotify_id: Option<&str>,
    ) -> Vec<SpotifyTrackInfo> {
        let Some(spotify) = self.spotify.as_ref() else {
            return Vec::new();
        };

        let artist_id = match spotify_id.filter(|id| !id.is_empty()) {
            Some(id) => Some(id.to_string()),
            None => match spotify.search_artists(artist_name, 1).await {
                Ok(found) => found.into_iter().next().map(|a| a.spotify_id),
                Err(e) => {
                    warn!("Could not search artist '{}': {}", artist_name, e);
                    None
                }
            },
        };
        let Some(artist_id) = artist_id else {
            return Vec::new();
        };

        match spotify.get_artist_top_tracks(&artist_id, spotify.market()).await {
            Ok(mut tracks) => {
                tracks.truncate(ARTIST_TOP_TRACKS);
                tracks
            }
            Err(e) => {
                warn!("Could not get top tracks for '{}': {}", artist_name, e);
                Vec::new()
            }
        }
    }

    /// Candidate tracks from Spotify search, or the built-in catalogue.
    async fn gather_candidates(
        &self,
        seeds: &Seeds,
        emotions: &[String],
    ) -> Result<Vec<SpotifyTrackInfo>> {
        let mut candidates = Vec::new();

        if let Some(spotify) = &self.spotify {
            let mut queries = Vec::new();
            for emotion in emotions {
                queries.extend(
                    self.queries
                        .generate_queries_for_emotion(emotion, EMOTION_QUERIES, true)
                        .await?,
                );
            }
            queries.extend(
                self.queries
                    .generate_queries_for_seed_songs(&seeds.songs, SEED_QUERIES)
                    .await?,
            );
            queries.extend(
                seeds
                    .artists
                    .iter()
                    .filter(|a| !a.trim().is_empty())
                    .map(|a| format!("artist:\"{}\"", a.trim())),
            );
            let queries = dedupe(queries);

            debug!("Searching Spotify with {} queries", queries.len());
            candidates = spotify
                .search_by_multiple_queries(&queries, RESULTS_PER_QUERY)
                .await;
        }

        candidates.retain(|t| !seeds.contains(t));
        if candidates.is_empty() {
            warn!("No Spotify candidates, ranking the built-in catalogue");
            candidates = catalogue::offline_tracks();
            candidates.retain(|t| !seeds.contains(t));
        }

        Ok(candidates)
    }

    /// Score candidates against the seed centroid and emotions, best first.
    async fn score_candidates(
        &self,
        candidates: Vec<SpotifyTrackInfo>,
        seed_centroid: Option<&[f32]>,
        emotions: &[String],
        emotion_vector: Option<&[f32]>,
    ) -> Result<Vec<Scored>> {
        let texts: Vec<String> = candidates
            .iter()
            .map(|t| song_text(&t.song_name, t.primary_artist()))
            .collect();

        let seed_scores: Option<Vec<f64>> = match seed_centroid {
            Some(centroid) => {
                let vectors = self.embeddings.encode_batch(&texts).await?;
                Some(
                    vectors
                        .iter()
                        .map(|v| f64::from(normalized_similarity(centroid, v)))
                        .collect(),
                )
            }
            None => None,
        };

        let emotion_scores: Option<Vec<f64>> = match emotion_vector {
            Some(blend) if !emotions.is_empty() => {
                let contextual = self
                    .context
                    .emotion_similarities(&texts, emotions, TextContext::Song)
                    .await?;
                let titles: Vec<String> = candidates.iter().map(|t| t.song_name.clone()).collect();
                let title_vectors = self.embeddings.encode_batch(&titles).await?;
                Some(
                    contextual
                        .iter()
                        .zip(&title_vectors)
                        .map(|(ctx, title)| {
                            CONTEXTUAL_WEIGHT * f64::from(*ctx)
                                + TITLE_WEIGHT * f64::from(normalized_similarity(blend, title))
                        })
                        .collect(),
                )
            }
            _ => None,
        };

        let mut scored: Vec<Scored> = candidates
            .into_iter()
            .enumerate()
            .map(|(i, track)| {
                let seed = seed_scores.as_ref().map(|s| s[i]);
                let emotion = emotion_scores.as_ref().map(|s| s[i]);
                Scored {
                    track,
                    score: blend_scores(seed, emotion),
                    lyrics: None,
                }
            })
            .collect();

        sort_scored(&mut scored);
        Ok(scored)
    }

    /// Fold lyrics matches into the leading candidates' scores.
    async fn enrich_with_lyrics(&self, scored: &mut [Scored], target: &str, num_results: usize) {
        let Some(genius) = &self.genius else {
            return;
        };

        let count = (num_results * 2).min(MAX_LYRICS_CANDIDATES).min(scored.len());
        let songs: Vec<(String, String)> = scored[..count]
            .iter()
            .map(|s| (s.track.song_name.clone(), s.track.primary_artist().to_string()))
            .collect();

        let profiles = genius
            .batch_emotional_profiles(&songs, Some(target), LYRICS_CONCURRENCY)
            .await;

        merge_lyrics(scored, count, &profiles);
    }
}

/// Re-score the first `count` candidates that have lyrics, then re-rank.
fn merge_lyrics(scored: &mut [Scored], count: usize, profiles: &HashMap<String, LyricsProfile>) {
    let count = count.min(scored.len());
    for entry in scored[..count].iter_mut() {
        let key = batch_key(&entry.track.song_name, entry.track.primary_artist());
        if let Some(profile) = profiles.get(&key).filter(|p| p.has_lyrics) {
            entry.score = apply_lyrics(entry.score, profile.emotion_match_score);
            entry.lyrics = Some(profile.clone());
        }
    }

    sort_scored(scored);
}

/// Combined query embedding; seeds share one weight, the emotion blend another.
fn combine(seed_vectors: &[Vec<f32>], emotion_vector: Option<&[f32]>) -> Result<Vec<f32>> {
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(seed_vectors.len() + 1);
    let mut weights: Vec<f32> = Vec::with_capacity(seed_vectors.len() + 1);

    if !seed_vectors.is_empty() {
        let share = if emotion_vector.is_some() { SEED_WEIGHT } else { 1.0 };
        let each = share / seed_vectors.len() as f32;
        for vector in seed_vectors {
            vectors.push(vector.clone());
            weights.push(each);
        }
    }

    if let Some(emotion) = emotion_vector {
        vectors.push(emotion.to_vec());
        weights.push(if seed_vectors.is_empty() { 1.0 } else { EMOTION_WEIGHT });
    }

    combine_embeddings(&vectors, Some(&weights))
}

fn blend_scores(seed: Option<f64>, emotion: Option<f64>) -> f64 {
    match (seed, emotion) {
        (Some(s), Some(e)) => SEED_SCORE_WEIGHT * s + EMOTION_SCORE_WEIGHT * e,
        (Some(s), None) => s,
        (None, Some(e)) => e,
        (None, None) => 0.0,
    }
}

fn apply_lyrics(score: f64, lyrics_score: f64) -> f64 {
    (1.0 - LYRICS_WEIGHT) * score + LYRICS_WEIGHT * lyrics_score
}

/// Best score first; equal scores go to the more popular track.
fn sort_scored(scored: &mut [Scored]) {
    scored.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => b.track.popularity.cmp(&a.track.popularity),
        other => other,
    });
}

fn dedupe(queries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .filter(|q| seen.insert(q.clone()))
        .collect()
}

fn to_song_result(scored: Scored) -> SongResult {
    let mut result = SongResult::from_track(&scored.track, scored.score.clamp(0.0, 1.0));
    if let Some(profile) = scored.lyrics {
        result.genius_url = Some(profile.genius_url);
        result.lyrics_emotion = profile.dominant_emotion;
        result.lyrics_score = Some(profile.emotion_match_score);
    }
    result
}
