//! DeepFilterNet noise suppression client
//!
//! Round-trips the waveform through the `deep-filter` command-line tool.
//! The enhanced audio comes back at the filter's native rate and is
//! resampled to the caller's rate so the pipeline sees a drop-in
//! replacement signal.

use crate::engines::{EngineError, NoiseSuppressor};
use crate::utils::{decode_audio_file, resample_mono, write_mono_wav};
use std::process::Command;

const BINARY: &str = "deep-filter";

/// Subprocess-backed noise suppressor
pub struct DeepFilterSuppressor {
    binary: String,
}

impl DeepFilterSuppressor {
    /// Verify the deep-filter binary is callable
    pub fn new() -> Result<Self, EngineError> {
        match Command::new(BINARY).arg("--version").output() {
            Ok(_) => Ok(Self {
                binary: BINARY.to_string(),
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

impl NoiseSuppressor for DeepFilterSuppressor {
    fn suppress(&mut self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>, EngineError> {
        let work_dir = tempfile::tempdir()?;
        let noisy_path = work_dir.path().join("noisy.wav");
        write_mono_wav(&noisy_path, samples, sample_rate)
            .map_err(|e| EngineError::ExecutionError(self.binary.clone(), e.to_string()))?;

        let output = Command::new(&self.binary)
            .arg(&noisy_path)
            .arg("-o")
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

        // deep-filter writes the enhanced file under the input's name
        let enhanced_path = work_dir.path().join("noisy.wav");
        if !enhanced_path.exists() {
            return Err(EngineError::OutputMissing(
                self.binary.clone(),
                enhanced_path.display().to_string(),
            ));
        }

        let enhanced = decode_audio_file(&enhanced_path)
            .map_err(|e| EngineError::ParseError(self.binary.clone(), e.to_string()))?;

        if enhanced.sample_rate == sample_rate {
            return Ok(enhanced.samples);
        }

        resample_mono(&enhanced.samples, enhanced.sample_rate, sample_rate)
            .map_err(|e| EngineError::ParseError(self.binary.clone(), e.to_string()))
    }
}
