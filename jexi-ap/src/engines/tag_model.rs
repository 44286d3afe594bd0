//! Audio event model client
//!
//! Calls a pretrained general-purpose audio tagger as an external tool.
//! Contract: the binary takes one audio file path and prints a JSON array
//! of `{"label": "...", "score": 0.0-1.0}` objects covering its full label
//! vocabulary, strongest first. The model-backed classifier maps that
//! distribution onto music vs. speech.

use crate::engines::{AudioTagModel, EngineError};
use crate::models::LabelScore;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

const BINARY: &str = "audioset-tagger";

#[derive(Debug, Deserialize)]
struct RawPrediction {
    label: String,
    score: f64,
}

/// Subprocess-backed audio event tagger
pub struct TagModelClient {
    binary: String,
}

impl TagModelClient {
    /// Verify the tagger binary is callable
    pub fn new() -> Result<Self, EngineError> {
        Self::with_binary(BINARY)
    }

    /// Use a custom tagger binary honoring the same I/O contract
    pub fn with_binary(binary: &str) -> Result<Self, EngineError> {
        match Command::new(binary).arg("--version").output() {
            Ok(_) => Ok(Self {
                binary: binary.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EngineError::BinaryNotFound(binary.to_string()))
            }
            Err(e) => Err(EngineError::ExecutionError(binary.to_string(), e.to_string())),
        }
    }
}

impl AudioTagModel for TagModelClient {
    fn predict(&mut self, audio_path: &Path) -> Result<Vec<LabelScore>, EngineError> {
        let output = Command::new(&self.binary)
            .arg(audio_path)
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

        let raw: Vec<RawPrediction> = serde_json::from_slice(&output.stdout)
            .map_err(|e| EngineError::ParseError(self.binary.clone(), e.to_string()))?;

        Ok(raw
            .into_iter()
            .map(|p| LabelScore {
                label: p.label,
                confidence: (p.score * 100.0).clamp(0.0, 100.0),
            })
            .collect())
    }
}
