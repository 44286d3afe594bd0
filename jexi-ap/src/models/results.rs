//! Tagged processing result types
//!
//! The durable representation of a finished job is exactly one of these
//! shapes, validated at the result store boundary rather than passed around
//! as loose JSON.

use crate::models::{ContentType, JobId, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The fixed closed set of stems produced by 6-way separation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemName {
    Vocals,
    Drums,
    Bass,
    Guitar,
    Piano,
    Other,
}

impl StemName {
    /// All stems, in separator output order
    pub fn all() -> [StemName; 6] {
        [
            StemName::Drums,
            StemName::Bass,
            StemName::Other,
            StemName::Vocals,
            StemName::Guitar,
            StemName::Piano,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StemName::Vocals => "vocals",
            StemName::Drums => "drums",
            StemName::Bass => "bass",
            StemName::Guitar => "guitar",
            StemName::Piano => "piano",
            StemName::Other => "other",
        }
    }
}

impl fmt::Display for StemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StemName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vocals" => Ok(StemName::Vocals),
            "drums" => Ok(StemName::Drums),
            "bass" => Ok(StemName::Bass),
            "guitar" => Ok(StemName::Guitar),
            "piano" => Ok(StemName::Piano),
            "other" => Ok(StemName::Other),
            other => Err(format!("unknown stem: {}", other)),
        }
    }
}

/// One separated stem on disk, flagged active when its RMS energy clears
/// the silence threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StemInfo {
    pub path: PathBuf,
    pub active: bool,
}

/// One transcribed lyric line with timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricLine {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Lyrics transcribed from the vocals stem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lyrics {
    pub plain: String,
    pub timestamped: Vec<LyricLine>,
}

impl Lyrics {
    /// Placeholder for instrumental tracks or unusable vocal stems
    pub fn none_detected() -> Self {
        Self {
            plain: "No lyrics detected (instrumental or unclear vocals)".to_string(),
            timestamped: Vec::new(),
        }
    }
}

/// One time-aligned transcript segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Speech transcript with plain text and time-aligned segments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub plain: String,
    pub segments: Vec<TranscriptSegment>,
    pub word_count: usize,
}

impl Transcript {
    pub fn no_speech() -> Self {
        Self {
            plain: "No speech detected".to_string(),
            segments: Vec::new(),
            word_count: 0,
        }
    }
}

/// Completed music job metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicResult {
    pub job_id: JobId,
    pub filename: String,
    pub status: JobStatus,
    pub content_type: ContentType,
    pub key: String,
    pub bpm: u32,
    /// "m:ss" display duration
    pub duration: String,
    pub sample_rate: u32,
    pub lyrics: Lyrics,
    pub stems: BTreeMap<StemName, StemInfo>,
    pub processed_at: DateTime<Utc>,
}

/// Completed speech job metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechResult {
    pub job_id: JobId,
    pub filename: String,
    pub status: JobStatus,
    pub content_type: ContentType,
    /// "m:ss" display duration
    pub duration: String,
    pub sample_rate: u32,
    pub transcript: Transcript,
    pub clean_audio_path: PathBuf,
    pub processed_at: DateTime<Utc>,
}

/// Failed job metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureResult {
    pub job_id: JobId,
    pub status: JobStatus,
    pub error: String,
    pub processed_at: DateTime<Utc>,
}

impl FailureResult {
    pub fn new(job_id: JobId, error: impl Into<String>) -> Self {
        Self {
            job_id,
            status: JobStatus::Failed,
            error: error.into(),
            processed_at: Utc::now(),
        }
    }
}

/// The one durable metadata record each job ends with
///
/// Variants are distinguished by their required fields (`stems`,
/// `transcript`, `error`), so existing records parse without an explicit
/// tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobMetadata {
    Music(MusicResult),
    Speech(SpeechResult),
    Failure(FailureResult),
}

impl JobMetadata {
    pub fn job_id(&self) -> &JobId {
        match self {
            JobMetadata::Music(r) => &r.job_id,
            JobMetadata::Speech(r) => &r.job_id,
            JobMetadata::Failure(r) => &r.job_id,
        }
    }

    pub fn status(&self) -> JobStatus {
        match self {
            JobMetadata::Music(r) => r.status,
            JobMetadata::Speech(r) => r.status,
            JobMetadata::Failure(r) => r.status,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            JobMetadata::Failure(r) => Some(&r.error),
            _ => None,
        }
    }
}
