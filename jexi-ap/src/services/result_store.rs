//! Durable job results on the local filesystem
//!
//! One directory per job under the processed root, holding a
//! `metadata.json` record plus stage artifacts (stems, transcripts,
//! cleaned audio). The store is the sole authority for a job once its
//! terminal record is written.

use crate::models::{JobId, JobMetadata, JobStatus, Transcript};
use jexi_common::time::format_srt_timestamp;
use std::path::{Path, PathBuf};
use thiserror::Error;

const METADATA_FILE: &str = "metadata.json";

/// Result store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid metadata record: {0}")]
    InvalidRecord(#[from] serde_json::Error),
}

/// Synthesized status summary for one job id
#[derive(Debug, Clone, PartialEq)]
pub enum StatusSummary {
    NotFound,
    Processing,
    Completed,
    Failed { error: String },
}

/// Filesystem-backed result store
pub struct ResultStore {
    processed_dir: PathBuf,
}

impl ResultStore {
    /// Open the store, creating the processed root if missing
    pub fn new(processed_dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&processed_dir)?;
        Ok(Self { processed_dir })
    }

    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.processed_dir.join(job_id.as_str())
    }

    pub fn stems_dir(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join("stems")
    }

    /// Create the job directory before any stage writes into it
    pub fn ensure_job_dir(&self, job_id: &JobId) -> Result<PathBuf, StoreError> {
        let dir = self.job_dir(job_id);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn ensure_stems_dir(&self, job_id: &JobId) -> Result<PathBuf, StoreError> {
        let dir = self.stems_dir(job_id);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Write the one metadata record for a job
    pub fn save_metadata(&self, metadata: &JobMetadata) -> Result<(), StoreError> {
        let dir = self.ensure_job_dir(metadata.job_id())?;
        let path = dir.join(METADATA_FILE);
        let json = serde_json::to_string_pretty(metadata)?;
        std::fs::write(&path, json)?;

        tracing::info!(
            job_id = %metadata.job_id(),
            status = %metadata.status(),
            path = %path.display(),
            "Metadata persisted"
        );
        Ok(())
    }

    /// Load a job's metadata record, if one exists
    pub fn get_metadata(&self, job_id: &JobId) -> Result<Option<JobMetadata>, StoreError> {
        let path = self.job_dir(job_id).join(METADATA_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let metadata: JobMetadata = serde_json::from_str(&content)?;
        Ok(Some(metadata))
    }

    /// Synthesize a status summary from the persisted record alone
    ///
    /// Unreadable records report as failed rather than panicking a poll.
    pub fn get_status(&self, job_id: &JobId) -> StatusSummary {
        match self.get_metadata(job_id) {
            Ok(None) => StatusSummary::NotFound,
            Ok(Some(metadata)) => match metadata.status() {
                JobStatus::Completed => StatusSummary::Completed,
                JobStatus::Failed => StatusSummary::Failed {
                    error: metadata
                        .error()
                        .unwrap_or("Unknown error")
                        .to_string(),
                },
                JobStatus::Pending | JobStatus::Processing => StatusSummary::Processing,
            },
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Corrupt metadata record");
                StatusSummary::Failed {
                    error: format!("Corrupt metadata record: {}", e),
                }
            }
        }
    }

    /// Write the three transcript export renditions for a speech job
    ///
    /// Returns the (txt, json, srt) paths.
    pub fn write_transcript_exports(
        &self,
        job_id: &JobId,
        transcript: &Transcript,
    ) -> Result<(PathBuf, PathBuf, PathBuf), StoreError> {
        let dir = self.ensure_job_dir(job_id)?;

        let txt_path = dir.join("transcript.txt");
        std::fs::write(&txt_path, &transcript.plain)?;

        let json_path = dir.join("transcript.json");
        std::fs::write(&json_path, serde_json::to_string_pretty(transcript)?)?;

        let srt_path = dir.join("transcript.srt");
        std::fs::write(&srt_path, render_srt(transcript))?;

        Ok((txt_path, json_path, srt_path))
    }

    /// Resolve a whitelisted artifact path inside a job directory
    ///
    /// Rejects anything that is not a known artifact name, which also
    /// closes off path traversal.
    pub fn artifact_path(&self, job_id: &JobId, artifact: &str) -> Option<PathBuf> {
        let relative: PathBuf = match artifact {
            "clean_audio.wav" | "transcript.txt" | "transcript.json" | "transcript.srt" => {
                PathBuf::from(artifact)
            }
            _ => {
                let stem_file = artifact.strip_prefix("stems/")?;
                let stem_name = stem_file.strip_suffix(".wav")?;
                stem_name.parse::<crate::models::StemName>().ok()?;
                Path::new("stems").join(stem_file)
            }
        };

        let path = self.job_dir(job_id).join(relative);
        path.exists().then_some(path)
    }
}

/// Render a transcript as SRT subtitle text
fn render_srt(transcript: &Transcript) -> String {
    let mut out = String::new();
    for (index, segment) in transcript.segments.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_timestamp(segment.start),
            format_srt_timestamp(segment.end),
            segment.text
        ));
    }
    out
}
