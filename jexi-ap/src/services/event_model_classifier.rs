//! Model-backed music/speech classification
//!
//! Maps a pretrained audio event model's output distribution onto the two
//! content types by summing the probability mass assigned to fixed music
//! and speech label sets, then normalizing. When neither set receives any
//! mass, the single strongest label's name decides.

use crate::models::{ContentType, LabelScore, Verdict};
use std::collections::{BTreeMap, HashSet};

/// Number of raw predictions surfaced to the caller
const TOP_N: usize = 5;

const MUSIC_LABELS: &[&str] = &[
    "Music",
    "Musical instrument",
    "Plucked string instrument",
    "Guitar",
    "Electric guitar",
    "Bass guitar",
    "Acoustic guitar",
    "Piano",
    "Keyboard (musical)",
    "Drum",
    "Drum kit",
    "Snare drum",
    "Bass drum",
    "Timpani",
    "Tabla",
    "Synthesizer",
    "Brass instrument",
    "Trumpet",
    "Trombone",
    "French horn",
    "Saxophone",
    "Clarinet",
    "Flute",
    "Violin",
    "Fiddle",
    "Cello",
    "Double bass",
    "Singing",
    "Choir",
    "Yodeling",
    "Chant",
    "Mantra",
    "Electronic music",
    "Techno",
    "House music",
    "Dubstep",
    "Drum and bass",
    "Hip hop music",
    "Rock music",
    "Heavy metal",
    "Punk rock",
    "Progressive rock",
    "Rock and roll",
    "Psychedelic rock",
    "Country",
    "Jazz",
    "Blues",
    "Reggae",
    "Soul music",
    "Funk",
    "Pop music",
    "Latin music",
    "Salsa music",
    "Carnatic music",
];

const SPEECH_LABELS: &[&str] = &[
    "Speech",
    "Narration, monologue",
    "Speech synthesizer",
    "Conversation",
    "Male speech, man speaking",
    "Female speech, woman speaking",
    "Child speech, kid speaking",
    "Babbling",
    "Baby laughter",
    "Whispering",
    "Laughter",
    "Shouting, screaming",
    "Crying, sobbing",
    "Cheering",
    "Throat clearing",
    "Cough",
    "Sneeze",
    "Sniff",
    "Sermon",
    "Podcast",
    "Audiobook",
];

/// Classifier over an external event model's label distribution
pub struct EventModelClassifier {
    music_labels: HashSet<&'static str>,
    speech_labels: HashSet<&'static str>,
}

impl Default for EventModelClassifier {
    fn default() -> Self {
        Self {
            music_labels: MUSIC_LABELS.iter().copied().collect(),
            speech_labels: SPEECH_LABELS.iter().copied().collect(),
        }
    }
}

impl EventModelClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a verdict from the model's full score distribution
    ///
    /// `predictions` carry 0-100 confidences over the model's label
    /// vocabulary.
    pub fn categorize(&self, predictions: &[LabelScore]) -> Verdict {
        let mut music_mass = 0.0f64;
        let mut speech_mass = 0.0f64;

        for prediction in predictions {
            if self.music_labels.contains(prediction.label.as_str()) {
                music_mass += prediction.confidence;
            } else if self.speech_labels.contains(prediction.label.as_str()) {
                speech_mass += prediction.confidence;
            }
        }

        let mut top_predictions: Vec<LabelScore> = predictions.to_vec();
        top_predictions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        top_predictions.truncate(TOP_N);

        let total = music_mass + speech_mass;
        let (label, confidence) = if total <= 0.0 {
            // Neither label set matched; inspect the strongest label's name
            self.fallback_from_top(&top_predictions)
        } else if music_mass > speech_mass {
            (ContentType::Music, music_mass / total * 100.0)
        } else {
            (ContentType::Speech, speech_mass / total * 100.0)
        };

        tracing::debug!(
            music_mass = music_mass,
            speech_mass = speech_mass,
            label = %label,
            confidence = confidence,
            "Event model categorization"
        );

        let mut tally = BTreeMap::new();
        tally.insert(label, 1usize);

        Verdict {
            label,
            per_sample: vec![label],
            tally,
            confidence,
            top_predictions,
        }
    }

    fn fallback_from_top(&self, top: &[LabelScore]) -> (ContentType, f64) {
        let Some(best) = top.first() else {
            return (ContentType::Speech, 0.0);
        };
        let lowered = best.label.to_ascii_lowercase();
        let is_musical = ["music", "singing", "instrument"]
            .iter()
            .any(|word| lowered.contains(word));
        if is_musical {
            (ContentType::Music, best.confidence)
        } else {
            (ContentType::Speech, best.confidence)
        }
    }
}
