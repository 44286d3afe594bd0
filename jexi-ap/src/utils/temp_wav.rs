//! Scoped temporary WAV conversion
//!
//! Some uploads arrive in containers the decoder cannot probe. They are
//! normalized to WAV via ffmpeg into a temp file that is deleted on all
//! exit paths. Deletion tolerates transient file locks with a brief retry.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use uuid::Uuid;

/// A temporary WAV rendition of another audio file
///
/// The file is removed when this guard drops.
#[derive(Debug)]
pub struct TempWav {
    path: PathBuf,
}

impl TempWav {
    /// Convert `input` to a temporary WAV file using ffmpeg
    pub fn convert(input: &Path) -> Result<Self> {
        let out_path = std::env::temp_dir().join(format!(
            "jexi_convert_{}.wav",
            Uuid::new_v4().simple()
        ));

        let output = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg(&out_path)
            .output()
            .context("Failed to execute ffmpeg (is it installed?)")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            remove_with_retry(&out_path);
            bail!(
                "ffmpeg conversion failed for {} (exit {:?}): {}",
                input.display(),
                output.status.code(),
                stderr.lines().last().unwrap_or("")
            );
        }

        if !out_path.exists() {
            bail!(
                "ffmpeg reported success but produced no output for {}",
                input.display()
            );
        }

        tracing::debug!(
            input = %input.display(),
            output = %out_path.display(),
            "Converted to temporary WAV"
        );

        Ok(Self { path: out_path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempWav {
    fn drop(&mut self) {
        remove_with_retry(&self.path);
    }
}

/// Delete a file, retrying briefly if an external lock blocks the first
/// attempt
fn remove_with_retry(path: &Path) {
    for attempt in 0..3 {
        match std::fs::remove_file(path) {
            Ok(()) => return,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                if attempt == 2 {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Could not remove temp file; leaving for OS cleanup"
                    );
                    return;
                }
                std::thread::sleep(Duration::from_millis(100));
            }
        }
    }
}
