//! HTTP handlers.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::AppState;
use crate::api::spotify::{check_spotify_id, track_query};
use crate::api::SpotifyApi;
use crate::error::{EmoRecError, Result};
use crate::models::{
    EmotionAnalysis, EmotionType, EmotionsResponse, FeatureRanges, HealthResponse, MoodCollage,
    PlaylistRequest, PlaylistResponse, SpotifyArtistInfo, SpotifyTrackInfo,
};

/// Leading embedding dimensions echoed back in playlist responses.
const EMBEDDING_PREVIEW: usize = 10;

const DEFAULT_RELATED: usize = 3;
const DEFAULT_SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub emotions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RelatedQuery {
    pub top_k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TrackSearchQuery {
    #[serde(default)]
    pub q: String,
    pub artist: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistSearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TopTracksQuery {
    pub market: Option<String>,
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "EmoRec API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Emotion-aware playlist generation from seed songs, artists and moods",
        "endpoints": {
            "health": "/api/v1/health",
            "emotions": "/api/v1/emotions",
            "analyze_emotions": "/api/v1/emotions/analyze",
            "emotion_features": "/api/v1/emotions/{emotion}/features",
            "related_emotions": "/api/v1/emotions/{emotion}/related",
            "generate_playlist": "/api/v1/generate-playlist",
            "spotify_search_tracks": "/api/v1/spotify/search/tracks",
            "spotify_search_artists": "/api/v1/spotify/search/artists",
        }
    }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// GET /api/v1/health
pub async fn service_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let services = BTreeMap::from([
        ("embedding_service".to_string(), true),
        ("emotion_mapper".to_string(), true),
        ("spotify".to_string(), state.spotify.is_some()),
        ("genius".to_string(), state.genius.is_some()),
    ]);
    let status = if services.values().all(|up| *up) {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}

/// GET /api/v1/emotions
pub async fn list_emotions() -> Json<EmotionsResponse> {
    Json(EmotionsResponse {
        emotions: EmotionType::all().iter().map(|e| e.as_str().to_string()).collect(),
        note: "Any free-text emotion is also accepted; unknown emotions are learned from their text"
            .to_string(),
    })
}

/// POST /api/v1/emotions/analyze
pub async fn analyze_emotions(
    State(state): State<AppState>,
    body: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<EmotionAnalysis>> {
    let Json(body) = body.map_err(invalid_body)?;
    let emotions: Vec<String> = body
        .emotions
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    let analysis = state.context.analyze_multi_emotion_query(&emotions).await?;
    Ok(Json(analysis))
}

/// GET /api/v1/emotions/:emotion/features
pub async fn emotion_features(
    State(state): State<AppState>,
    Path(emotion): Path<String>,
) -> Json<FeatureRanges> {
    Json(state.mapper.ranges_for(&emotion))
}

/// GET /api/v1/emotions/:emotion/related
pub async fn related_emotions(
    State(state): State<AppState>,
    Path(emotion): Path<String>,
    query: std::result::Result<Query<RelatedQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query.map_err(invalid_query)?;
    let top_k = query
        .top_k
        .unwrap_or(DEFAULT_RELATED)
        .clamp(1, EmotionType::all().len());
    let related = state.context.find_related_emotions(&emotion, top_k).await?;

    Ok(Json(json!({
        "emotion": emotion,
        "related": related,
    })))
}

/// POST /api/v1/generate-playlist
pub async fn generate_playlist(
    State(state): State<AppState>,
    request: std::result::Result<Json<PlaylistRequest>, JsonRejection>,
) -> Result<Json<PlaylistResponse>> {
    let Json(request) = request.map_err(invalid_body)?;
    let started = Instant::now();
    let outcome = state.playlist.generate(&request).await?;

    let mood_collage = if request.include_collage {
        render_collage(&state, outcome.combined_embedding.clone(), request.normalized_emotions())
            .await
    } else {
        None
    };

    info!(
        "Generated playlist with {} songs in {:?}",
        outcome.playlist.len(),
        started.elapsed()
    );

    Ok(Json(PlaylistResponse {
        playlist: outcome.playlist,
        mood_collage,
        emotion_features: outcome.emotion_features,
        combined_embedding: Some(
            outcome
                .combined_embedding
                .into_iter()
                .take(EMBEDDING_PREVIEW)
                .collect(),
        ),
    }))
}

/// Render off the async runtime; a failed collage never fails the playlist.
async fn render_collage(
    state: &AppState,
    embedding: Vec<f32>,
    emotions: Vec<String>,
) -> Option<MoodCollage> {
    let generator = state.collage;
    let label = (!emotions.is_empty()).then(|| emotions.join(", "));

    let rendered =
        tokio::task::spawn_blocking(move || generator.generate(&embedding, label.as_deref())).await;

    match rendered {
        Ok(Ok(collage)) => Some(collage),
        Ok(Err(e)) => {
            warn!("Mood collage generation failed: {}", e);
            None
        }
        Err(e) => {
            warn!("Mood collage task failed: {}", e);
            None
        }
    }
}

fn invalid_body(rejection: JsonRejection) -> EmoRecError {
    EmoRecError::InvalidRequest(rejection.body_text())
}

fn invalid_query(rejection: QueryRejection) -> EmoRecError {
    EmoRecError::InvalidRequest(rejection.body_text())
}

fn spotify(state: &AppState) -> Result<&SpotifyApi> {
    state.spotify.as_ref().ok_or_else(|| {
        EmoRecError::ServiceUnavailable("Spotify credentials are not configured".to_string())
    })
}

fn require_query(q: &str) -> Result<&str> {
    let q = q.trim();
    if q.is_empty() {
        return Err(EmoRecError::InvalidRequest("Query parameter 'q' is required".to_string()));
    }
    Ok(q)
}

/// GET /api/v1/spotify/search/tracks
pub async fn search_tracks(
    State(state): State<AppState>,
    query: std::result::Result<Query<TrackSearchQuery>, QueryRejection>,
) -> Result<Json<Vec<SpotifyTrackInfo>>> {
    let Query(query) = query.map_err(invalid_query)?;
    let q = require_query(&query.q)?;
    let spotify = spotify(&state)?;

    let search = match query.artist.as_deref() {
        Some(artist) => track_query(q, Some(artist)),
        None => q.to_string(),
    };
    debug!("Proxying Spotify track search: {}", search);

    let tracks = spotify
        .search_tracks(&search, query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
        .await?;
    Ok(Json(tracks))
}

/// GET /api/v1/spotify/search/artists
pub async fn search_artists(
    State(state): State<AppState>,
    query: std::result::Result<Query<ArtistSearchQuery>, QueryRejection>,
) -> Result<Json<Vec<SpotifyArtistInfo>>> {
    let Query(query) = query.map_err(invalid_query)?;
    let q = require_query(&query.q)?;
    let artists = spotify(&state)?
        .search_artists(q, query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
        .await?;
    Ok(Json(artists))
}

/// GET /api/v1/spotify/tracks/:id
pub async fn get_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SpotifyTrackInfo>> {
    let id = check_spotify_id(&id)?;
    Ok(Json(spotify(&state)?.get_track(id).await?))
}

/// GET /api/v1/spotify/artists/:id
pub async fn get_artist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SpotifyArtistInfo>> {
    let id = check_spotify_id(&id)?;
    Ok(Json(spotify(&state)?.get_artist(id).await?))
}

/// GET /api/v1/spotify/artists/:id/top-tracks
pub async fn get_artist_top_tracks(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: std::result::Result<Query<TopTracksQuery>, QueryRejection>,
) -> Result<Json<Vec<SpotifyTrackInfo>>> {
    let Query(query) = query.map_err(invalid_query)?;
    let id = check_spotify_id(&id)?;
    let spotify = spotify(&state)?;
    let market = query.market.unwrap_or_else(|| spotify.market().to_string());
    Ok(Json(spotify.get_artist_top_tracks(id, &market).await?))
}
