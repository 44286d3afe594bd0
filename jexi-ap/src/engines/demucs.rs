//! Demucs stem separation client
//!
//! Invokes the `demucs` command-line tool with its 6-source model and reads
//! the separated stem WAVs back into memory. The output directory is a
//! scoped temp dir, removed when separation finishes.

use crate::engines::{EngineError, SeparatedStems, StemSeparator};
use crate::models::StemName;
use crate::utils::decode_audio_file;
use std::path::Path;
use std::process::Command;

const BINARY: &str = "demucs";
const MODEL: &str = "htdemucs_6s";

/// Subprocess-backed 6-way stem separator
pub struct DemucsSeparator {
    binary: String,
    model: String,
}

impl DemucsSeparator {
    /// Verify the demucs binary is callable
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

impl StemSeparator for DemucsSeparator {
    fn separate(&mut self, audio_path: &Path) -> Result<SeparatedStems, EngineError> {
        let out_dir = tempfile::tempdir()?;

        tracing::info!(
            input = %audio_path.display(),
            model = %self.model,
            "Running stem separation"
        );

        let output = Command::new(&self.binary)
            .arg("-n")
            .arg(&self.model)
            .arg("-o")
            .arg(out_dir.path())
            .arg("--filename")
            .arg("{stem}.{ext}")
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

        let stem_dir = out_dir.path().join(&self.model);
        let mut sample_rate = 0u32;
        let mut stems = Vec::with_capacity(StemName::all().len());

        for name in StemName::all() {
            let stem_path = stem_dir.join(format!("{}.wav", name));
            if !stem_path.exists() {
                return Err(EngineError::OutputMissing(
                    self.binary.clone(),
                    stem_path.display().to_string(),
                ));
            }

            let decoded = decode_audio_file(&stem_path).map_err(|e| {
                EngineError::ParseError(self.binary.clone(), e.to_string())
            })?;

            if sample_rate == 0 {
                sample_rate = decoded.sample_rate;
            }
            stems.push((name, decoded.samples));
        }

        Ok(SeparatedStems { sample_rate, stems })
    }
}
