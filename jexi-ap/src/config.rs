//! Service configuration
//!
//! All classifier thresholds and pipeline tunables live here with serde
//! defaults matching the shipped rule set, so a TOML config file can
//! override any of them individually.

use crate::models::ContentType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bind address for the HTTP server
    pub listen_addr: String,
    /// Root data folder; uploads/ and processed/ live beneath it
    pub data_folder: PathBuf,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
    /// Accepted upload file extensions
    pub allowed_extensions: Vec<String>,
    pub classifier: ClassifierConfig,
    pub music: MusicConfig,
    pub speech: SpeechConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:5000".to_string(),
            data_folder: jexi_common::config::default_data_folder(),
            max_upload_bytes: 100 * 1024 * 1024,
            allowed_extensions: ["mp3", "wav", "ogg", "flac", "m4a"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            classifier: ClassifierConfig::default(),
            music: MusicConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a TOML file, falling back to defaults for missing keys
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_folder.join("uploads")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_folder.join("processed")
    }

    pub fn extension_allowed(&self, filename: &str) -> bool {
        let ext = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return false,
        };
        self.allowed_extensions.iter().any(|a| a == &ext)
    }
}

/// Content classifier tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Analysis window length per sampling point, in seconds
    pub window_secs: f64,
    /// Label awarded when the majority vote ties on an even sample count
    pub tie_break: ContentType,
    pub thresholds: ClassifierThresholds,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            window_secs: 30.0,
            tie_break: ContentType::Speech,
            thresholds: ClassifierThresholds::default(),
        }
    }
}

/// Thresholds of the additive scoring rule table
///
/// Each value gates one rule; the weights are fixed but every threshold is
/// tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// Zero-crossing rate above this reads as speech
    pub zcr_speech: f64,
    /// Zero-crossing rate below this reads as music
    pub zcr_music: f64,
    /// Beats/sec above this reads as music (strong weight)
    pub beat_strength_music: f64,
    /// Beats/sec below this reads as speech
    pub beat_strength_speech: f64,
    /// Spectral rolloff (Hz) above this reads as music
    pub rolloff_music: f64,
    /// Spectral rolloff (Hz) below this reads as speech
    pub rolloff_speech: f64,
    /// Spectral centroid (Hz) below this reads as speech
    pub centroid_speech: f64,
    /// Spectral centroid (Hz) above this reads as music
    pub centroid_music: f64,
    /// Centroid std above this is ambiguous; resolved by the ZCR rule
    pub centroid_std_high: f64,
    /// Spectral bandwidth (Hz) above this reads as music
    pub bandwidth_music: f64,
    /// Spectral bandwidth (Hz) below this reads as speech
    pub bandwidth_speech: f64,
    /// RMS std below this (consistent energy) reads as music
    pub rms_std_music: f64,
    /// RMS std above this (pauses) reads as speech
    pub rms_std_speech: f64,
    /// MFCC std above this reads as speech
    pub mfcc_std_speech: f64,
    /// MFCC std above this (but below the speech cut) reads as music
    pub mfcc_std_music: f64,
    /// Tempi outside [tempo_min, tempo_max] BPM read as speech
    pub tempo_min: f64,
    pub tempo_max: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            zcr_speech: 0.15,
            zcr_music: 0.08,
            beat_strength_music: 1.5,
            beat_strength_speech: 0.8,
            rolloff_music: 5000.0,
            rolloff_speech: 3500.0,
            centroid_speech: 2000.0,
            centroid_music: 3000.0,
            centroid_std_high: 1200.0,
            bandwidth_music: 1800.0,
            bandwidth_speech: 1400.0,
            rms_std_music: 0.04,
            rms_std_speech: 0.06,
            mfcc_std_speech: 100.0,
            mfcc_std_music: 40.0,
            tempo_min: 60.0,
            tempo_max: 200.0,
        }
    }
}

/// Music pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    /// RMS threshold against full-scale amplitude; stems below it are
    /// flagged inactive
    pub stem_activity_rms: f32,
    /// Analysis sample rate for key/tempo detection
    pub analysis_sample_rate: u32,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            stem_activity_rms: 0.01,
            analysis_sample_rate: 44100,
        }
    }
}

/// Speech pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Standard rate for speech processing and transcription
    pub sample_rate: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self { sample_rate: 16000 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_rule_table() {
        let t = ClassifierThresholds::default();
        assert_eq!(t.zcr_speech, 0.15);
        assert_eq!(t.zcr_music, 0.08);
        assert_eq!(t.beat_strength_music, 1.5);
        assert_eq!(t.rolloff_music, 5000.0);
        assert_eq!(t.tempo_max, 200.0);
    }

    #[test]
    fn partial_toml_overrides_single_threshold() {
        let toml_str = r#"
            listen_addr = "0.0.0.0:8080"

            [classifier.thresholds]
            zcr_speech = 0.2
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.classifier.thresholds.zcr_speech, 0.2);
        // Untouched values keep their defaults
        assert_eq!(config.classifier.thresholds.zcr_music, 0.08);
        assert_eq!(config.max_upload_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let config = AppConfig::default();
        assert!(config.extension_allowed("track.MP3"));
        assert!(config.extension_allowed("voice.wav"));
        assert!(!config.extension_allowed("clip.mov"));
        assert!(!config.extension_allowed("noextension"));
    }

    #[test]
    fn tie_break_configurable() {
        let toml_str = r#"
            [classifier]
            tie_break = "music"
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.classifier.tie_break, ContentType::Music);
    }
}
