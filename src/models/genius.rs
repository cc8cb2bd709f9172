//! Genius lyrics models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top search hit for a song on Genius.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeniusSong {
    pub song_id: u64,
    pub title: String,
    pub artist: String,
    /// Lyrics page URL.
    pub url: String,
}

/// Emotional reading of a song's lyrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LyricsProfile {
    pub song_id: u64,
    pub genius_url: String,
    /// Emotion -> number of keyword hits in the lyrics.
    pub emotional_keywords: BTreeMap<String, u32>,
    pub dominant_emotion: Option<String>,
    /// Match against the requested emotion (0-1).
    pub emotion_match_score: f64,
    pub word_count: usize,
    pub has_lyrics: bool,
}
