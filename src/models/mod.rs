//! Data models for EmoRec requests, responses and upstream catalogue data.
//!
//! These are plain data-transfer shapes shared between the REST API and
//! the Spotify/Genius clients.

pub mod emotion;
pub mod genius;
pub mod request;
pub mod response;
pub mod track;

// Re-exports for convenience
pub use emotion::{AudioFeature, EmotionType, FeatureRange, FeatureRanges};
pub use genius::{GeniusSong, LyricsProfile};
pub use request::{ArtistInput, PlaylistRequest, SongInput};
pub use response::{
    EmotionAnalysis, EmotionPair, EmotionsResponse, HealthResponse, MoodCollage,
    PlaylistResponse, RelatedEmotion, VisualParams,
};
pub use track::{SongResult, SpotifyArtistInfo, SpotifyTrackInfo};
