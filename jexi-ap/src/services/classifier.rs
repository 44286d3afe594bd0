//! Heuristic music/speech content classifier
//!
//! Samples a file at one to three time offsets, extracts acoustic features
//! per sample, scores each sample with an additive weighted rule set, and
//! aggregates the per-sample labels by majority vote.
//!
//! Classification failure (undecodable input, corrupt samples) is an error,
//! never a guessed label.

use crate::config::{ClassifierConfig, ClassifierThresholds};
use crate::models::{ContentType, Verdict};
use crate::services::feature_extractor::{FeatureError, FeatureExtractor, FeatureVector};
use crate::utils::{decode_audio_file, decode_window, probe_duration, TempWav};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Classification errors
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Input could not be decoded, even after format conversion
    #[error("Failed to decode audio: {0}")]
    Decode(#[source] anyhow::Error),

    /// Feature extraction failed on a decoded sample
    #[error(transparent)]
    Feature(#[from] FeatureError),
}

/// Additive rule scores for one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleScore {
    pub music: f64,
    pub speech: f64,
}

impl SampleScore {
    /// Per-sample decision; equal scores fall to speech
    pub fn label(&self) -> ContentType {
        if self.music > self.speech {
            ContentType::Music
        } else {
            ContentType::Speech
        }
    }
}

/// Content classifier with tunable thresholds
pub struct ContentClassifier {
    config: ClassifierConfig,
    extractor: FeatureExtractor,
}

impl ContentClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            extractor: FeatureExtractor::new(),
        }
    }

    /// Classify a file as music or speech
    pub fn classify(&self, audio_path: &Path) -> Result<Verdict, ClassifyError> {
        // Normalize to a decodable container when the native probe fails
        let (path, _conversion_guard) = decodable_path(audio_path)?;

        let duration = match probe_duration(&path).map_err(ClassifyError::Decode)? {
            Some(d) => d,
            // Containers without a frame count need a full decode
            None => {
                decode_audio_file(&path)
                    .map_err(ClassifyError::Decode)?
                    .duration_seconds
            }
        };

        let offsets = sampling_offsets(duration, self.config.window_secs);

        let mut per_sample = Vec::with_capacity(offsets.len());
        let mut scores = Vec::with_capacity(offsets.len());
        for &offset in &offsets {
            let decoded = decode_window(&path, offset, self.config.window_secs)
                .map_err(ClassifyError::Decode)?;
            let features = self
                .extractor
                .extract(&decoded.samples, decoded.sample_rate)?;

            let score = score_sample(&features, &self.config.thresholds);
            tracing::debug!(
                path = %audio_path.display(),
                offset = offset,
                music_score = score.music,
                speech_score = score.speech,
                zcr = features.zcr_mean,
                centroid = features.spectral_centroid_mean,
                beat_strength = features.beat_strength,
                "Sample scored"
            );

            per_sample.push(score.label());
            scores.push(score);
        }

        Ok(self.aggregate(per_sample, &scores))
    }

    /// Majority vote with the configured tie-break
    fn aggregate(&self, per_sample: Vec<ContentType>, scores: &[SampleScore]) -> Verdict {
        let mut tally: BTreeMap<ContentType, usize> = BTreeMap::new();
        for &label in &per_sample {
            *tally.entry(label).or_insert(0) += 1;
        }

        let music_votes = tally.get(&ContentType::Music).copied().unwrap_or(0);
        let speech_votes = tally.get(&ContentType::Speech).copied().unwrap_or(0);

        let label = if music_votes > speech_votes {
            ContentType::Music
        } else if speech_votes > music_votes {
            ContentType::Speech
        } else {
            self.config.tie_break
        };

        let winning_mass: f64 = scores
            .iter()
            .map(|s| match label {
                ContentType::Music => s.music,
                ContentType::Speech => s.speech,
            })
            .sum();
        let total_mass: f64 = scores.iter().map(|s| s.music + s.speech).sum();
        let confidence = if total_mass > 0.0 {
            (winning_mass / total_mass * 100.0).clamp(0.0, 100.0)
        } else {
            // No rule fired on any sample; the verdict is the tie-break
            50.0
        };

        Verdict {
            label,
            per_sample,
            tally,
            confidence,
            top_predictions: Vec::new(),
        }
    }
}

/// Choose a decodable path, converting through ffmpeg when necessary
///
/// The returned guard keeps any temp conversion alive until classification
/// finishes; dropping it deletes the file.
fn decodable_path(audio_path: &Path) -> Result<(PathBuf, Option<TempWav>), ClassifyError> {
    match probe_duration(audio_path) {
        Ok(_) => Ok((audio_path.to_path_buf(), None)),
        Err(probe_err) => {
            tracing::debug!(
                path = %audio_path.display(),
                error = %probe_err,
                "Native decode failed, converting to WAV"
            );
            let temp = TempWav::convert(audio_path).map_err(ClassifyError::Decode)?;
            Ok((temp.path().to_path_buf(), Some(temp)))
        }
    }
}

/// Sampling offsets for a file of the given duration
///
/// <30s: one point at the start; 30-90s: start and middle; longer: start,
/// middle, and end-minus-window. All offsets clamp to non-negative.
pub fn sampling_offsets(duration_secs: f64, window_secs: f64) -> Vec<f64> {
    if duration_secs < window_secs {
        return vec![0.0];
    }
    let last = (duration_secs - window_secs).max(0.0);
    let middle = (last / 2.0).max(0.0);
    if duration_secs < 3.0 * window_secs {
        vec![0.0, middle]
    } else {
        vec![0.0, middle, last]
    }
}

/// Evaluate the additive weighted rule table against one feature vector
///
/// Pure and deterministic: identical features always produce identical
/// scores. Multiple rules may fire per sample.
pub fn score_sample(features: &FeatureVector, t: &ClassifierThresholds) -> SampleScore {
    let mut music = 0.0;
    let mut speech = 0.0;

    // Zero-crossing rate: abrupt transitions read as speech
    if features.zcr_mean > t.zcr_speech {
        speech += 3.0;
    } else if features.zcr_mean < t.zcr_music {
        music += 2.0;
    }

    // Regular strong beats read as music; weak or irregular as speech
    if features.beat_strength > t.beat_strength_music {
        music += 3.0;
    } else if features.beat_strength < t.beat_strength_speech {
        speech += 2.0;
    }

    // Music fills more of the spectrum
    if features.spectral_rolloff_mean > t.rolloff_music {
        music += 2.0;
    } else if features.spectral_rolloff_mean < t.rolloff_speech {
        speech += 2.0;
    }

    // Speech concentrates in lower frequencies
    if features.spectral_centroid_mean < t.centroid_speech {
        speech += 2.0;
    } else if features.spectral_centroid_mean > t.centroid_music {
        music += 2.0;
    }

    // Very dynamic spectra could be either; the ZCR rule arbitrates
    if features.spectral_centroid_std > t.centroid_std_high {
        if features.zcr_mean > t.zcr_speech {
            speech += 1.0;
        } else {
            music += 1.0;
        }
    }

    if features.spectral_bandwidth_mean > t.bandwidth_music {
        music += 1.0;
    } else if features.spectral_bandwidth_mean < t.bandwidth_speech {
        speech += 1.0;
    }

    // Consistent energy reads as music; pauses between words as speech
    if features.rms_std < t.rms_std_music {
        music += 2.0;
    } else if features.rms_std > t.rms_std_speech {
        speech += 1.0;
    }

    // Extreme cepstral variation indicates speech dynamics
    if features.mfcc_std > t.mfcc_std_speech {
        speech += 2.0;
    } else if features.mfcc_std > t.mfcc_std_music {
        music += 1.0;
    }

    // Tempi outside the musical range
    if features.tempo_bpm < t.tempo_min || features.tempo_bpm > t.tempo_max {
        speech += 1.0;
    }

    SampleScore { music, speech }
}
