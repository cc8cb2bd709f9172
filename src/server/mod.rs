//! REST surface.
//!
//! [`AppState`] wires the services together once at startup;
//! [`build_router`] exposes them over HTTP.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::{GeniusApi, SpotifyApi};
use crate::collage::MoodCollageGenerator;
use crate::config::Config;
use crate::embedding::{Embedder, EmbeddingService};
use crate::emotion::{EmotionContext, EmotionMapper};
use crate::error::Result;
use crate::playlist::PlaylistGenerator;
use crate::search::SearchQueryGenerator;

/// Services shared across HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub embeddings: Arc<EmbeddingService>,
    pub mapper: Arc<EmotionMapper>,
    pub context: Arc<EmotionContext>,
    pub queries: Arc<SearchQueryGenerator>,
    pub playlist: Arc<PlaylistGenerator>,
    pub spotify: Option<SpotifyApi>,
    pub genius: Option<GeniusApi>,
    pub collage: MoodCollageGenerator,
}

impl AppState {
    /// Build every service from `config`.
    ///
    /// Missing Spotify or Genius credentials disable that integration
    /// instead of failing.
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing embedding service ({:?})", config.embedding.provider);
        let embeddings = Arc::new(EmbeddingService::new(Embedder::from_config(&config.embedding)?));

        let mapper = Arc::new(EmotionMapper::new());
        let context = Arc::new(EmotionContext::new(Arc::clone(&embeddings)).await?);
        let queries = Arc::new(SearchQueryGenerator::new(Arc::clone(&embeddings)).await?);

        let spotify = match config.spotify_credentials() {
            Some((id, secret)) => {
                info!("Spotify client configured (market {})", config.spotify_market);
                Some(SpotifyApi::new(id, secret)?.with_market(&config.spotify_market))
            }
            None => {
                warn!("Spotify credentials not set; using the built-in catalogue");
                None
            }
        };

        let genius = match config.genius_token() {
            Some(token) => {
                info!("Genius client configured");
                Some(GeniusApi::new(token)?)
            }
            None => {
                warn!("Genius token not set; lyrics enrichment disabled");
                None
            }
        };

        let playlist = PlaylistGenerator::new(
            Arc::clone(&embeddings),
            Arc::clone(&mapper),
            Arc::clone(&context),
            Arc::clone(&queries),
        )
        .with_spotify(spotify.clone())
        .with_genius(genius.clone());

        Ok(Self {
            embeddings,
            mapper,
            context,
            queries,
            playlist: Arc::new(playlist),
            spotify,
            genius,
            collage: MoodCollageGenerator::new(config.collage_width, config.collage_height),
        })
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(routes::service_health))
        .route("/emotions", get(routes::list_emotions))
        .route("/emotions/analyze", post(routes::analyze_emotions))
        .route("/emotions/:emotion/features", get(routes::emotion_features))
        .route("/emotions/:emotion/related", get(routes::related_emotions))
        .route("/generate-playlist", post(routes::generate_playlist))
        .route("/spotify/search/tracks", get(routes::search_tracks))
        .route("/spotify/search/artists", get(routes::search_artists))
        .route("/spotify/tracks/:id", get(routes::get_track))
        .route("/spotify/artists/:id", get(routes::get_artist))
        .route("/spotify/artists/:id/top-tracks", get(routes::get_artist_top_tracks));

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .nest("/api/v1", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
