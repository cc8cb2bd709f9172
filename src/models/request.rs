//! Request payloads accepted by the REST API.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{EmoRecError, Result};

/// Smallest playlist we will generate.
pub const MIN_RESULTS: u32 = 1;

/// Largest playlist we will generate.
pub const MAX_RESULTS: u32 = 50;

/// A seed song supplied by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SongInput {
    /// Name of the song.
    pub song_name: String,

    /// Artist name.
    pub artist: String,

    /// Spotify track ID if the client already resolved it.
    #[serde(default)]
    pub spotify_id: Option<String>,
}

impl SongInput {
    pub fn new<S1: Into<String>, S2: Into<String>>(song_name: S1, artist: S2) -> Self {
        Self {
            song_name: song_name.into(),
            artist: artist.into(),
            spotify_id: None,
        }
    }
}

/// A seed artist supplied by the user; their top tracks act as seed songs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArtistInput {
    /// Name of the artist.
    pub artist_name: String,

    /// Spotify artist ID if the client already resolved it.
    #[serde(default)]
    pub spotify_id: Option<String>,
}

/// Body of `POST /api/v1/generate-playlist`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistRequest {
    /// Seed songs for embedding-based search.
    #[serde(default)]
    pub songs: Option<Vec<SongInput>>,

    /// Seed artists; their top tracks are used for embedding-based search.
    #[serde(default)]
    pub artists: Option<Vec<ArtistInput>>,

    /// Emotion descriptors, predefined or free text. A bare string is
    /// accepted as a single-element list.
    #[serde(default, deserialize_with = "one_or_many")]
    pub emotion: Option<Vec<String>>,

    /// Number of songs to return.
    #[serde(default = "default_num_results")]
    pub num_results: u32,

    /// Whether to score candidates against Genius lyrics.
    #[serde(default = "default_true")]
    pub enrich_with_lyrics: bool,

    /// Whether to render a mood collage.
    #[serde(default)]
    pub include_collage: bool,
}

fn default_num_results() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for PlaylistRequest {
    fn default() -> Self {
        Self {
            songs: None,
            artists: None,
            emotion: None,
            num_results: default_num_results(),
            enrich_with_lyrics: true,
            include_collage: false,
        }
    }
}

impl PlaylistRequest {
    /// Request driven purely by emotions.
    pub fn for_emotions<I, S>(emotions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emotion: Some(emotions.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Emotions trimmed, lower-cased, with blanks removed.
    pub fn normalized_emotions(&self) -> Vec<String> {
        self.emotion
            .iter()
            .flatten()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }

    pub fn seed_songs(&self) -> &[SongInput] {
        self.songs.as_deref().unwrap_or_default()
    }

    pub fn seed_artists(&self) -> &[ArtistInput] {
        self.artists.as_deref().unwrap_or_default()
    }

    /// Check the request can produce a playlist.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RESULTS..=MAX_RESULTS).contains(&self.num_results) {
            return Err(EmoRecError::InvalidRequest(format!(
                "num_results must be between {} and {}, got {}",
                MIN_RESULTS, MAX_RESULTS, self.num_results
            )));
        }

        if self.seed_songs().is_empty()
            && self.seed_artists().is_empty()
            && self.normalized_emotions().is_empty()
        {
            return Err(EmoRecError::InvalidRequest(
                "Must provide at least one of songs, artists or emotion".to_string(),
            ));
        }

        Ok(())
    }
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) => Some(vec![s]),
        Some(OneOrMany::Many(v)) => Some(v),
        None => None,
    })
}
