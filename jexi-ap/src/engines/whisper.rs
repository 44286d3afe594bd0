//! Whisper speech-to-text client
//!
//! Writes the waveform to a temp WAV, invokes the `whisper` command-line
//! tool with JSON output, and parses the time-aligned segments.

use crate::engines::{EngineError, RawSegment, Transcriber, TranscriptionOutput};
use crate::utils::write_mono_wav;
use serde::Deserialize;
use std::process::Command;

const BINARY: &str = "whisper";
const MODEL: &str = "base";

#[derive(Debug, Deserialize)]
struct WhisperJson {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

/// Subprocess-backed transcription engine
pub struct WhisperTranscriber {
    binary: String,
    model: String,
}

impl WhisperTranscriber {
    /// Verify the whisper binary is callable
    pub fn new() -> Result<Self, EngineError> {
        match Command::new(BINARY).arg("--help").output() {
            Ok(_) => Ok(Self {
                binary: BINARY.to_string(),
                model: MODEL.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EngineError::BinaryNotFound(BINARY.to_string()))
            }
            Err(e) => Err(EngineError::ExecutionError(
                BINARY.to_string(),
                e.to_string(),
            )),
        }
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<TranscriptionOutput, EngineError> {
        let work_dir = tempfile::tempdir()?;
        let input_path = work_dir.path().join("input.wav");
        write_mono_wav(&input_path, samples, sample_rate)
            .map_err(|e| EngineError::ExecutionError(self.binary.clone(), e.to_string()))?;

        let output = Command::new(&self.binary)
            .arg(&input_path)
            .arg("--model")
            .arg(&self.model)
            .arg("--output_format")
            .arg("json")
            .arg("--output_dir")
            .arg(work_dir.path())
            .output()
            .map_err(|e| EngineError::ExecutionError(self.binary.clone(), e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::EngineFailed(
                self.binary.clone(),
                format!(
                    "exit {:?}: {}",
                    output.status.code(),
                    stderr.lines().last().unwrap_or("")
                ),
            ));
        }

        let json_path = work_dir.path().join("input.json");
        if !json_path.exists() {
            return Err(EngineError::OutputMissing(
                self.binary.clone(),
                json_path.display().to_string(),
            ));
        }

        let content = std::fs::read_to_string(&json_path)?;
        let parsed: WhisperJson = serde_json::from_str(&content)
            .map_err(|e| EngineError::ParseError(self.binary.clone(), e.to_string()))?;

        Ok(TranscriptionOutput {
            text: parsed.text.trim().to_string(),
            segments: parsed
                .segments
                .into_iter()
                .map(|s| RawSegment {
                    start: (s.start * 100.0).round() / 100.0,
                    end: (s.end * 100.0).round() / 100.0,
                    text: s.text.trim().to_string(),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whisper_json_parses_segments() {
        let json = r#"{
            "text": " Hello there, general listener.",
            "segments": [
                {"start": 0.0, "end": 1.48, "text": " Hello there,"},
                {"start": 1.48, "end": 2.9, "text": " general listener."}
            ]
        }"#;
        let parsed: WhisperJson = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.segments.len(), 2);
        assert_eq!(parsed.segments[1].start, 1.48);
    }

    #[test]
    fn whisper_json_tolerates_missing_fields() {
        let parsed: WhisperJson = serde_json::from_str("{}").unwrap();
        assert!(parsed.text.is_empty());
        assert!(parsed.segments.is_empty());
    }
}
