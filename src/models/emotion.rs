//! Emotion-related models.
//!
//! Predefined emotion labels and the audio-feature ranges they map to.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EmoRecError;

/// Predefined emotion labels.
///
/// Free-text emotions are accepted everywhere an emotion is expected; these
/// are the ones with hand-tuned audio-feature mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionType {
    Happy,
    Sad,
    Energetic,
    Calm,
    Angry,
    Melancholic,
    Hopeful,
    Romantic,
    Anxious,
    Peaceful,
    Tired,
    Confident,
    Rebellious,
    Playful,
    Sensual,
    Empowered,
    Vulnerable,
    Mysterious,
    Dreamy,
    Grateful,
    Lonely,
    Inspired,
    Conflicted,
    Carefree,
    Love,
    Nostalgic,
}

impl EmotionType {
    /// All predefined emotions, in declaration order.
    pub fn all() -> &'static [EmotionType] {
        use EmotionType::*;
        &[
            Happy,
            Sad,
            Energetic,
            Calm,
            Angry,
            Melancholic,
            Hopeful,
            Romantic,
            Anxious,
            Peaceful,
            Tired,
            Confident,
            Rebellious,
            Playful,
            Sensual,
            Empowered,
            Vulnerable,
            Mysterious,
            Dreamy,
            Grateful,
            Lonely,
            Inspired,
            Conflicted,
            Carefree,
            Love,
            Nostalgic,
        ]
    }

    /// Wire label for this emotion.
    pub fn as_str(&self) -> &'static str {
        use EmotionType::*;
        match self {
            Happy => "happy",
            Sad => "sad",
            Energetic => "energetic",
            Calm => "calm",
            Angry => "angry",
            Melancholic => "melancholic",
            Hopeful => "hopeful",
            Romantic => "romantic",
            Anxious => "anxious",
            Peaceful => "peaceful",
            Tired => "tired",
            Confident => "confident",
            Rebellious => "rebellious",
            Playful => "playful",
            Sensual => "sensual",
            Empowered => "empowered",
            Vulnerable => "vulnerable",
            Mysterious => "mysterious",
            Dreamy => "dreamy",
            Grateful => "grateful",
            Lonely => "lonely",
            Inspired => "inspired",
            Conflicted => "conflicted",
            Carefree => "carefree",
            Love => "love",
            Nostalgic => "nostalgic",
        }
    }
}

impl fmt::Display for EmotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionType {
    type Err = EmoRecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        EmotionType::all()
            .iter()
            .copied()
            .find(|e| e.as_str() == needle)
            .ok_or_else(|| EmoRecError::InvalidRequest(format!("Unknown emotion: {}", s)))
    }
}

/// Audio descriptors a track can be characterised by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFeature {
    Valence,
    Energy,
    Danceability,
    Tempo,
    Acousticness,
    Loudness,
    Instrumentalness,
}

impl AudioFeature {
    /// Wire label for this feature.
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFeature::Valence => "valence",
            AudioFeature::Energy => "energy",
            AudioFeature::Danceability => "danceability",
            AudioFeature::Tempo => "tempo",
            AudioFeature::Acousticness => "acousticness",
            AudioFeature::Loudness => "loudness",
            AudioFeature::Instrumentalness => "instrumentalness",
        }
    }
}

/// Inclusive `(min, max)` target range for one audio feature.
///
/// Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange(pub f64, pub f64);

impl FeatureRange {
    pub fn min(&self) -> f64 {
        self.0
    }

    pub fn max(&self) -> f64 {
        self.1
    }

    /// Center of the range.
    pub fn midpoint(&self) -> f64 {
        (self.0 + self.1) / 2.0
    }

    /// Whether `value` falls inside the range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.0 && value <= self.1
    }
}

/// Feature ranges keyed by feature, in a stable order.
pub type FeatureRanges = BTreeMap<AudioFeature, FeatureRange>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_type_values() {
        assert_eq!(EmotionType::Happy.as_str(), "happy");
        assert_eq!(EmotionType::Melancholic.as_str(), "melancholic");
        assert_eq!(EmotionType::Nostalgic.as_str(), "nostalgic");
    }

    #[test]
    fn test_emotion_type_count() {
        assert_eq!(EmotionType::all().len(), 26);
    }

    #[test]
    fn test_emotion_from_str_is_case_insensitive() {
        assert_eq!("  Happy ".parse::<EmotionType>().unwrap(), EmotionType::Happy);
        assert!("bored".parse::<EmotionType>().is_err());
    }

    #[test]
    fn test_emotion_serde_matches_as_str() {
        for emotion in EmotionType::all() {
            let json = serde_json::to_string(emotion).unwrap();
            assert_eq!(json, format!("\"{}\"", emotion.as_str()));
        }
    }

    #[test]
    fn test_feature_ranges_serialize_as_arrays() {
        let mut ranges = FeatureRanges::new();
        ranges.insert(AudioFeature::Valence, FeatureRange(0.6, 1.0));
        ranges.insert(AudioFeature::Tempo, FeatureRange(100.0, 180.0));

        let json = serde_json::to_value(&ranges).unwrap();
        assert_eq!(json["valence"], serde_json::json!([0.6, 1.0]));
        assert_eq!(json["tempo"], serde_json::json!([100.0, 180.0]));
    }

    #[test]
    fn test_feature_range_helpers() {
        let range = FeatureRange(60.0, 100.0);
        assert_eq!(range.midpoint(), 80.0);
        assert!(range.contains(60.0));
        assert!(!range.contains(101.0));
    }
}
