//! Track and artist models.
//!
//! `SpotifyTrackInfo` / `SpotifyArtistInfo` are flattened views of Spotify
//! catalogue objects; `SongResult` is a ranked playlist entry.

use serde::{Deserialize, Serialize};

/// A Spotify track, flattened for API consumers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SpotifyTrackInfo {
    /// Spotify track ID.
    pub spotify_id: String,

    /// Track title.
    pub song_name: String,

    /// Artist names joined with ", ".
    pub artist: String,

    /// Artist names in credit order.
    #[serde(default)]
    pub artists: Vec<String>,

    /// Album title.
    pub album: String,

    /// 30 second preview, when Spotify offers one.
    #[serde(default)]
    pub preview_url: Option<String>,

    /// Link to the track on open.spotify.com.
    pub external_url: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Spotify popularity (0-100).
    #[serde(default)]
    pub popularity: u32,

    /// Largest album cover.
    #[serde(default)]
    pub album_image: Option<String>,
}

impl SpotifyTrackInfo {
    /// Get the primary artist name.
    ///
    /// Falls back to the whole `artist` string when individual credits are
    /// unknown, since artist names may themselves contain ", ".
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(String::as_str).unwrap_or(&self.artist)
    }
}

/// A Spotify artist, flattened for API consumers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SpotifyArtistInfo {
    /// Spotify artist ID.
    pub spotify_id: String,

    /// Artist name.
    pub name: String,

    /// Genres Spotify associates with the artist.
    #[serde(default)]
    pub genres: Vec<String>,

    /// Spotify popularity (0-100).
    #[serde(default)]
    pub popularity: u32,

    /// Largest artist picture.
    #[serde(default)]
    pub image_url: Option<String>,

    /// Link to the artist on open.spotify.com.
    pub external_url: String,
}

/// One ranked entry in a generated playlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SongResult {
    pub song_name: String,
    pub artist: String,
    #[serde(default)]
    pub spotify_id: Option<String>,

    /// Match score (0-1).
    pub similarity_score: f64,

    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub album_image: Option<String>,

    /// Genius lyrics page URL.
    #[serde(default)]
    pub genius_url: Option<String>,

    /// Dominant emotion detected from lyrics.
    #[serde(default)]
    pub lyrics_emotion: Option<String>,

    /// Lyrics-based emotion match score (0-1).
    #[serde(default)]
    pub lyrics_score: Option<f64>,
}

impl SongResult {
    /// Build a result from a Spotify track and its score.
    pub fn from_track(track: &SpotifyTrackInfo, similarity_score: f64) -> Self {
        Self {
            song_name: track.song_name.clone(),
            artist: track.artist.clone(),
            spotify_id: Some(track.spotify_id.clone()).filter(|id| !id.is_empty()),
            similarity_score,
            album: Some(track.album.clone()).filter(|a| !a.is_empty()),
            preview_url: track.preview_url.clone(),
            external_url: Some(track.external_url.clone()).filter(|u| !u.is_empty()),
            duration_ms: Some(track.duration_ms).filter(|d| *d > 0),
            popularity: Some(track.popularity),
            album_image: track.album_image.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_track() -> SpotifyTrackInfo {
        SpotifyTrackInfo {
            spotify_id: "4u7EnebtmKWzUH433cf5Qv".to_string(),
            song_name: "Bohemian Rhapsody".to_string(),
            artist: "Queen, Freddie Mercury".to_string(),
            artists: vec!["Queen".to_string(), "Freddie Mercury".to_string()],
            album: "A Night at the Opera".to_string(),
            external_url: "https://open.spotify.com/track/4u7EnebtmKWzUH433cf5Qv".to_string(),
            duration_ms: 354000,
            popularity: 88,
            ..Default::default()
        }
    }

    #[test]
    fn test_primary_artist() {
        assert_eq!(sample_track().primary_artist(), "Queen");
    }

    #[test]
    fn test_primary_artist_keeps_commas_in_names() {
        let track = SpotifyTrackInfo {
            song_name: "See You Again".to_string(),
            artist: "Tyler, The Creator, Kali Uchis".to_string(),
            artists: vec!["Tyler, The Creator".to_string(), "Kali Uchis".to_string()],
            ..Default::default()
        };
        assert_eq!(track.primary_artist(), "Tyler, The Creator");
    }

    #[test]
    fn test_primary_artist_without_credits_uses_artist_field() {
        let track = SpotifyTrackInfo {
            artist: "Tyler, The Creator".to_string(),
            ..Default::default()
        };
        assert_eq!(track.primary_artist(), "Tyler, The Creator");
    }

    #[test]
    fn test_song_result_from_track() {
        let result = SongResult::from_track(&sample_track(), 0.75);
        assert_eq!(result.song_name, "Bohemian Rhapsody");
        assert_eq!(result.spotify_id.as_deref(), Some("4u7EnebtmKWzUH433cf5Qv"));
        assert_eq!(result.duration_ms, Some(354000));
        assert_eq!(result.popularity, Some(88));
        assert!(result.genius_url.is_none());
    }

    #[test]
    fn test_song_result_from_offline_track_drops_empty_fields() {
        let track = SpotifyTrackInfo {
            song_name: "Imagine".to_string(),
            artist: "John Lennon".to_string(),
            ..Default::default()
        };
        let result = SongResult::from_track(&track, 0.5);
        assert!(result.spotify_id.is_none());
        assert!(result.album.is_none());
        assert!(result.external_url.is_none());
        assert!(result.duration_ms.is_none());
    }
}
