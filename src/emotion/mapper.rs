//! Static emotion to audio-feature mapping.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::models::{AudioFeature, EmotionType, FeatureRange, FeatureRanges};

use AudioFeature::*;

/// Free-text keywords and the predefined emotion they imply.
///
/// Matching is by substring, in table order.
const KEYWORDS: &[(&str, EmotionType)] = &[
    ("happy", EmotionType::Happy),
    ("joy", EmotionType::Happy),
    ("joyful", EmotionType::Happy),
    ("cheerful", EmotionType::Happy),
    ("glad", EmotionType::Happy),
    ("excited", EmotionType::Happy),
    ("sad", EmotionType::Sad),
    ("depressed", EmotionType::Sad),
    ("down", EmotionType::Sad),
    ("unhappy", EmotionType::Sad),
    ("sorrowful", EmotionType::Sad),
    ("melancholy", EmotionType::Melancholic),
    ("melancholic", EmotionType::Melancholic),
    ("wistful", EmotionType::Melancholic),
    ("bittersweet", EmotionType::Melancholic),
    ("energetic", EmotionType::Energetic),
    ("hyper", EmotionType::Energetic),
    ("upbeat", EmotionType::Energetic),
    ("pumped", EmotionType::Energetic),
    ("active", EmotionType::Energetic),
    ("calm", EmotionType::Calm),
    ("relaxed", EmotionType::Calm),
    ("chill", EmotionType::Calm),
    ("mellow", EmotionType::Calm),
    ("tranquil", EmotionType::Calm),
    ("angry", EmotionType::Angry),
    ("rage", EmotionType::Angry),
    ("aggressive", EmotionType::Angry),
    ("furious", EmotionType::Angry),
    ("mad", EmotionType::Angry),
    ("hopeful", EmotionType::Hopeful),
    ("optimistic", EmotionType::Hopeful),
    ("romantic", EmotionType::Romantic),
    ("love", EmotionType::Love),
    ("loving", EmotionType::Love),
    ("anxious", EmotionType::Anxious),
    ("nervous", EmotionType::Anxious),
    ("worried", EmotionType::Anxious),
    ("stressed", EmotionType::Anxious),
    ("peaceful", EmotionType::Peaceful),
    ("serene", EmotionType::Peaceful),
    ("tired", EmotionType::Tired),
    ("exhausted", EmotionType::Tired),
    ("weary", EmotionType::Tired),
    ("sleepy", EmotionType::Tired),
    ("confident", EmotionType::Confident),
    ("bold", EmotionType::Confident),
    ("brave", EmotionType::Confident),
    ("proud", EmotionType::Confident),
    ("rebellious", EmotionType::Rebellious),
    ("rebel", EmotionType::Rebellious),
    ("defiant", EmotionType::Rebellious),
    ("playful", EmotionType::Playful),
    ("fun", EmotionType::Playful),
    ("silly", EmotionType::Playful),
    ("lighthearted", EmotionType::Playful),
    ("sensual", EmotionType::Sensual),
    ("sexy", EmotionType::Sensual),
    ("seductive", EmotionType::Sensual),
    ("empowered", EmotionType::Empowered),
    ("powerful", EmotionType::Empowered),
    ("strong", EmotionType::Empowered),
    ("vulnerable", EmotionType::Vulnerable),
    ("fragile", EmotionType::Vulnerable),
    ("exposed", EmotionType::Vulnerable),
    ("mysterious", EmotionType::Mysterious),
    ("enigmatic", EmotionType::Mysterious),
    ("dark", EmotionType::Mysterious),
    ("dreamy", EmotionType::Dreamy),
    ("ethereal", EmotionType::Dreamy),
    ("floating", EmotionType::Dreamy),
    ("grateful", EmotionType::Grateful),
    ("thankful", EmotionType::Grateful),
    ("blessed", EmotionType::Grateful),
    ("lonely", EmotionType::Lonely),
    ("alone", EmotionType::Lonely),
    ("isolated", EmotionType::Lonely),
    ("inspired", EmotionType::Inspired),
    ("motivated", EmotionType::Inspired),
    ("driven", EmotionType::Inspired),
    ("conflicted", EmotionType::Conflicted),
    ("torn", EmotionType::Conflicted),
    ("confused", EmotionType::Conflicted),
    ("carefree", EmotionType::Carefree),
    ("free", EmotionType::Carefree),
    ("easy", EmotionType::Carefree),
    ("nostalgic", EmotionType::Nostalgic),
    ("reminiscent", EmotionType::Nostalgic),
];

/// Maps emotions onto target audio-feature ranges.
#[derive(Debug, Clone)]
pub struct EmotionMapper {
    mappings: HashMap<EmotionType, FeatureRanges>,
}

impl Default for EmotionMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl EmotionMapper {
    pub fn new() -> Self {
        let mappings: HashMap<EmotionType, FeatureRanges> = EmotionType::all()
            .iter()
            .map(|e| (*e, static_ranges(*e)))
            .collect();
        info!("Emotion mapper initialized with {} predefined emotions", mappings.len());
        Self { mappings }
    }

    /// Feature ranges for one or more emotions.
    ///
    /// Several emotions are resolved one by one and blended by averaging.
    pub fn get_feature_ranges<S: AsRef<str>>(&self, emotions: &[S]) -> FeatureRanges {
        match emotions {
            [] => {
                warn!("Empty emotion list provided, using neutral defaults");
                neutral_ranges()
            }
            [single] => self.ranges_for(single.as_ref()),
            many => {
                debug!("Blending {} emotions", many.len());
                let all: Vec<FeatureRanges> =
                    many.iter().map(|e| self.ranges_for(e.as_ref())).collect();
                let blended = blend(&all);
                info!(
                    "Blended {} emotions into {} feature ranges",
                    many.len(),
                    blended.len()
                );
                blended
            }
        }
    }

    /// Feature ranges for a single emotion, predefined or free text.
    pub fn ranges_for(&self, emotion: &str) -> FeatureRanges {
        let emotion = emotion.trim().to_lowercase();

        if let Ok(known) = emotion.parse::<EmotionType>() {
            if let Some(ranges) = self.mappings.get(&known) {
                return ranges.clone();
            }
        }

        let matched = parse_custom_emotion(&emotion);
        if matched.is_empty() {
            warn!("Unknown emotion '{}', using neutral defaults", emotion);
            return neutral_ranges();
        }

        debug!("Custom emotion '{}' matched {:?}", emotion, matched);
        let all: Vec<FeatureRanges> = matched
            .iter()
            .filter_map(|e| self.mappings.get(e).cloned())
            .collect();
        blend(&all)
    }
}

/// Predefined emotions whose keywords appear in free text.
///
/// Duplicates are kept, so a text hitting two keywords of one emotion
/// weighs that emotion twice when blending.
pub fn parse_custom_emotion(text: &str) -> Vec<EmotionType> {
    let text = text.to_lowercase();
    KEYWORDS
        .iter()
        .filter(|(keyword, _)| text.contains(keyword))
        .map(|(_, emotion)| *emotion)
        .collect()
}

/// Ranges used when nothing is known about the mood.
pub fn neutral_ranges() -> FeatureRanges {
    ranges(&[
        (Valence, 0.3, 0.7),
        (Energy, 0.3, 0.7),
        (Danceability, 0.3, 0.7),
        (Tempo, 80.0, 140.0),
    ])
}

/// Average min and max per feature over the range sets that define it.
fn blend(all: &[FeatureRanges]) -> FeatureRanges {
    if all.is_empty() {
        return neutral_ranges();
    }

    let mut sums: FeatureRanges = FeatureRanges::new();
    let mut counts: HashMap<AudioFeature, u32> = HashMap::new();

    for set in all {
        for (feature, range) in set {
            let entry = sums.entry(*feature).or_insert(FeatureRange(0.0, 0.0));
            entry.0 += range.0;
            entry.1 += range.1;
            *counts.entry(*feature).or_insert(0) += 1;
        }
    }

    for (feature, range) in sums.iter_mut() {
        let n = f64::from(counts.get(feature).copied().unwrap_or(1));
        range.0 /= n;
        range.1 /= n;
    }
    sums
}

fn ranges(entries: &[(AudioFeature, f64, f64)]) -> FeatureRanges {
    entries
        .iter()
        .map(|(feature, min, max)| (*feature, FeatureRange(*min, *max)))
        .collect()
}

/// Hand-tuned feature ranges per predefined emotion.
fn static_ranges(emotion: EmotionType) -> FeatureRanges {
    use EmotionType as E;
    match emotion {
        E::Happy => ranges(&[
            (Valence, 0.6, 1.0),
            (Energy, 0.5, 1.0),
            (Danceability, 0.5, 1.0),
            (Tempo, 100.0, 180.0),
        ]),
        E::Sad => ranges(&[
            (Valence, 0.0, 0.4),
            (Energy, 0.0, 0.5),
            (Acousticness, 0.3, 1.0),
            (Tempo, 60.0, 100.0),
        ]),
        E::Energetic => ranges(&[
            (Energy, 0.7, 1.0),
            (Danceability, 0.6, 1.0),
            (Tempo, 120.0, 200.0),
        ]),
        E::Calm => ranges(&[
            (Valence, 0.3, 0.7),
            (Energy, 0.0, 0.4),
            (Acousticness, 0.4, 1.0),
            (Tempo, 60.0, 100.0),
        ]),
        E::Angry => ranges(&[
            (Valence, 0.0, 0.3),
            (Energy, 0.7, 1.0),
            (Loudness, -10.0, 0.0),
            (Tempo, 120.0, 180.0),
        ]),
        E::Melancholic => ranges(&[
            (Valence, 0.0, 0.4),
            (Energy, 0.2, 0.5),
            (Acousticness, 0.4, 1.0),
            (Instrumentalness, 0.0, 0.7),
        ]),
        E::Hopeful => ranges(&[
            (Valence, 0.4, 0.8),
            (Energy, 0.4, 0.7),
            (Acousticness, 0.2, 0.8),
        ]),
        E::Romantic => ranges(&[
            (Valence, 0.4, 0.8),
            (Energy, 0.2, 0.6),
            (Acousticness, 0.3, 0.9),
            (Danceability, 0.3, 0.7),
        ]),
        E::Anxious => ranges(&[
            (Valence, 0.2, 0.5),
            (Energy, 0.5, 0.9),
            (Tempo, 100.0, 160.0),
        ]),
        E::Peaceful => ranges(&[
            (Valence, 0.4, 0.8),
            (Energy, 0.0, 0.3),
            (Acousticness, 0.5, 1.0),
            (Instrumentalness, 0.2, 1.0),
        ]),
        E::Tired => ranges(&[
            (Valence, 0.2, 0.5),
            (Energy, 0.0, 0.3),
            (Tempo, 60.0, 90.0),
            (Acousticness, 0.3, 0.8),
        ]),
        E::Confident => ranges(&[
            (Valence, 0.5, 0.9),
            (Energy, 0.6, 1.0),
            (Loudness, -8.0, 0.0),
            (Tempo, 100.0, 140.0),
        ]),
        E::Rebellious => ranges(&[
            (Valence, 0.3, 0.7),
            (Energy, 0.7, 1.0),
            (Loudness, -8.0, 0.0),
            (Tempo, 120.0, 180.0),
        ]),
        E::Playful => ranges(&[
            (Valence, 0.6, 1.0),
            (Energy, 0.5, 0.9),
            (Danceability, 0.5, 1.0),
            (Tempo, 100.0, 150.0),
        ]),
        E::Sensual => ranges(&[
            (Valence, 0.4, 0.7),
            (Energy, 0.3, 0.6),
            (Danceability, 0.4, 0.8),
            (Tempo, 80.0, 120.0),
        ]),
        E::Empowered => ranges(&[
            (Valence, 0.5, 0.9),
            (Energy, 0.6, 1.0),
            (Loudness, -10.0, 0.0),
            (Tempo, 100.0, 150.0),
        ]),
        E::Vulnerable => ranges(&[
            (Valence, 0.2, 0.6),
            (Energy, 0.2, 0.5),
            (Acousticness, 0.4, 1.0),
            (Tempo, 70.0, 110.0),
        ]),
        E::Mysterious => ranges(&[
            (Valence, 0.2, 0.5),
            (Energy, 0.3, 0.6),
            (Acousticness, 0.2, 0.7),
            (Instrumentalness, 0.3, 0.8),
        ]),
        E::Dreamy => ranges(&[
            (Valence, 0.3, 0.7),
            (Energy, 0.2, 0.5),
            (Acousticness, 0.3, 0.8),
            (Instrumentalness, 0.1, 0.6),
        ]),
        E::Grateful => ranges(&[
            (Valence, 0.6, 0.9),
            (Energy, 0.3, 0.7),
            (Acousticness, 0.3, 0.8),
        ]),
        E::Lonely => ranges(&[
            (Valence, 0.0, 0.3),
            (Energy, 0.1, 0.4),
            (Acousticness, 0.4, 1.0),
            (Tempo, 60.0, 100.0),
        ]),
        E::Inspired => ranges(&[
            (Valence, 0.5, 0.9),
            (Energy, 0.5, 0.9),
            (Tempo, 100.0, 140.0),
        ]),
        E::Conflicted => ranges(&[
            (Valence, 0.2, 0.5),
            (Energy, 0.4, 0.7),
            (Tempo, 90.0, 130.0),
        ]),
        E::Carefree => ranges(&[
            (Valence, 0.6, 1.0),
            (Energy, 0.4, 0.8),
            (Danceability, 0.4, 0.8),
            (Tempo, 90.0, 130.0),
        ]),
        E::Love => ranges(&[
            (Valence, 0.5, 0.9),
            (Energy, 0.3, 0.7),
            (Acousticness, 0.2, 0.8),
            (Danceability, 0.3, 0.7),
        ]),
        E::Nostalgic => ranges(&[
            (Valence, 0.3, 0.6),
            (Energy, 0.2, 0.5),
            (Acousticness, 0.4, 0.9),
            (Tempo, 70.0, 110.0),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_predefined_emotion() {
        let mapper = EmotionMapper::new();
        let ranges = mapper.get_feature_ranges(&["happy"]);
        assert_eq!(ranges.get(&Valence), Some(&FeatureRange(0.6, 1.0)));
        assert_eq!(ranges.get(&Tempo), Some(&FeatureRange(100.0, 180.0)));
        assert_eq!(ranges.len(), 4);
    }

    #[test]
    fn test_predefined_emotion_ignores_case() {
        let mapper = EmotionMapper::new();
        assert_eq!(mapper.ranges_for("  SAD "), mapper.ranges_for("sad"));
    }

    #[test]
    fn test_empty_list_is_neutral() {
        let mapper = EmotionMapper::new();
        let empty: [&str; 0] = [];
        assert_eq!(mapper.get_feature_ranges(&empty), neutral_ranges());
    }

    #[test]
    fn test_unknown_emotion_is_neutral() {
        let mapper = EmotionMapper::new();
        assert_eq!(mapper.ranges_for("xyzzy"), neutral_ranges());
    }

    #[test]
    fn test_custom_emotion_blends_keywords() {
        let mapper = EmotionMapper::new();
        let ranges = mapper.ranges_for("melancholic but hopeful");

        // melancholic valence (0.0, 0.4) and hopeful valence (0.4, 0.8)
        let valence = ranges[&Valence];
        assert!(approx(valence.min(), 0.2));
        assert!(approx(valence.max(), 0.6));

        // only melancholic defines instrumentalness
        assert_eq!(ranges[&Instrumentalness], FeatureRange(0.0, 0.7));
    }

    #[test]
    fn test_parse_custom_emotion_keeps_duplicates() {
        let matched = parse_custom_emotion("carefree");
        assert_eq!(matched, vec![EmotionType::Carefree, EmotionType::Carefree]);
    }

    #[test]
    fn test_multiple_emotions_average_ranges() {
        let mapper = EmotionMapper::new();
        let ranges = mapper.get_feature_ranges(&["happy", "sad"]);

        let valence = ranges[&Valence];
        assert!(approx(valence.min(), 0.3));
        assert!(approx(valence.max(), 0.7));

        // danceability comes only from happy
        assert_eq!(ranges[&Danceability], FeatureRange(0.5, 1.0));
        // acousticness comes only from sad
        assert_eq!(ranges[&Acousticness], FeatureRange(0.3, 1.0));
    }

    #[test]
    fn test_every_predefined_emotion_has_ranges() {
        let mapper = EmotionMapper::new();
        for emotion in EmotionType::all() {
            let ranges = mapper.ranges_for(emotion.as_str());
            assert!(!ranges.is_empty(), "{} has no ranges", emotion);
            assert!(ranges.values().all(|r| r.min() <= r.max()));
        }
    }
}
