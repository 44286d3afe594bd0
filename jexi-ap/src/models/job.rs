//! Job identity and lifecycle state machine
//!
//! A job is created at confirmation time (not upload time) and progresses
//! created -> processing -> {completed | failed}. Terminal states are
//! immutable and job ids are single-use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque short job identifier (8 hex characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh id from a v4 UUID prefix
    pub fn generate() -> Self {
        let full = Uuid::new_v4().simple().to_string();
        Self(full[..8].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Dominant content of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Music,
    Speech,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Music => "music",
            ContentType::Speech => "speech",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "music" => Ok(ContentType::Music),
            "speech" => Ok(ContentType::Speech),
            other => Err(format!("invalid content type: {}", other)),
        }
    }
}

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// In-memory job record, owned by the JobRegistry while non-terminal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub content_type: ContentType,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub source_file: PathBuf,
}

impl Job {
    pub fn new(content_type: ContentType, source_file: PathBuf) -> Self {
        Self {
            id: JobId::generate(),
            content_type,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            source_file,
        }
    }

    /// Attempt a state transition; terminal states reject further changes
    pub fn transition_to(&mut self, new_status: JobStatus) -> bool {
        if self.status.is_terminal() {
            tracing::warn!(
                job_id = %self.id,
                current = %self.status,
                requested = %new_status,
                "Ignoring transition out of terminal state"
            );
            return false;
        }
        self.status = new_status;
        true
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
