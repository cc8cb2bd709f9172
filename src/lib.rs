//! # EmoRec
//!
//! Emotion-aware playlist generation.
//!
//! Seed songs, seed artists and free-text emotions are embedded into one
//! query vector; candidate tracks come from Spotify search (or a built-in
//! catalogue when Spotify is not configured) and are ranked by embedding
//! similarity, optionally refined by how well their Genius lyrics match the
//! requested mood. A procedurally drawn mood collage can accompany each
//! playlist.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use emorec::{build_router, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let state = AppState::new(&config).await?;
//!
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr()?).await?;
//!     axum::serve(listener, build_router(state)).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Building blocks
//!
//! - [`EmbeddingService`] - text embeddings and similarity helpers
//! - [`EmotionMapper`] - emotion to audio-feature ranges
//! - [`EmotionContext`] - contextual emotion embeddings and analysis
//! - [`SearchQueryGenerator`] - Spotify queries from emotions and seeds
//! - [`PlaylistGenerator`] - end-to-end playlist ranking
//! - [`MoodCollageGenerator`] - mood images from embeddings

pub mod api;
pub mod collage;
pub mod config;
pub mod converters;
pub mod embedding;
pub mod emotion;
pub mod error;
pub mod models;
pub mod playlist;
pub mod search;
pub mod server;

pub use api::{GeniusApi, SpotifyApi};
pub use collage::MoodCollageGenerator;
pub use config::{Config, EmbeddingConfig, EmbeddingProvider};
pub use embedding::EmbeddingService;
pub use emotion::{EmotionContext, EmotionMapper};
pub use error::{EmoRecError, Result};
pub use models::{EmotionType, PlaylistRequest, PlaylistResponse, SongResult};
pub use playlist::PlaylistGenerator;
pub use search::SearchQueryGenerator;
pub use server::{build_router, AppState};
