//! Response payloads returned by the REST API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::emotion::FeatureRanges;
use super::track::SongResult;

/// Body returned by `POST /api/v1/generate-playlist`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistResponse {
    /// Generated playlist songs, best match first.
    pub playlist: Vec<SongResult>,

    /// Generated mood collage, when requested.
    #[serde(default)]
    pub mood_collage: Option<MoodCollage>,

    /// Audio feature ranges used for emotion matching.
    #[serde(default)]
    pub emotion_features: Option<FeatureRanges>,

    /// Leading dimensions of the combined query embedding (for debugging).
    #[serde(default)]
    pub combined_embedding: Option<Vec<f32>>,
}

/// Parameters the collage renderer derived from an embedding.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VisualParams {
    /// Base hue in degrees (0-360).
    pub primary_hue: f64,
    /// HSV saturation (0-1).
    pub saturation: f64,
    /// HSV value (0-1).
    pub value: f64,
    /// Spread of the normalized embedding (0-1).
    pub complexity: f64,
    /// How close the embedding sits to its midpoint (0-1).
    pub symmetry: f64,
    /// Gaussian blur sigma.
    pub blur_amount: f64,
    pub num_shapes: u32,
    #[serde(default)]
    pub emotion: Option<String>,
}

/// A generated image summarizing a mood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodCollage {
    /// PNG bytes, base64 encoded.
    pub image_base64: String,
    /// `#rrggbb` colours sampled from the image.
    pub dominant_colors: Vec<String>,
    pub visual_params: VisualParams,
    pub width: u32,
    pub height: u32,
}

/// Body returned by `GET /api/v1/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: BTreeMap<String, bool>,
}

/// Body returned by `GET /api/v1/emotions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionsResponse {
    pub emotions: Vec<String>,
    pub note: String,
}

/// Two emotions and the cosine similarity between them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmotionPair {
    pub first: String,
    pub second: String,
    pub similarity: f32,
}

/// An emotion ranked by closeness to a query emotion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelatedEmotion {
    pub emotion: String,
    pub similarity: f32,
}

/// How a set of emotions relate to each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionAnalysis {
    pub emotions: Vec<String>,
    /// Predefined emotion closest to the blend of all inputs.
    pub blended_emotion: Option<String>,
    pub blend_confidence: f32,
    /// Pairs that pull in opposite directions.
    pub conflicts: Vec<EmotionPair>,
    /// Pairs that reinforce each other.
    pub harmonies: Vec<EmotionPair>,
    pub is_coherent: bool,
    /// Inputs that were not predefined and had to be learned.
    pub learned_emotions: Vec<String>,
}
