//! Uploaded file records and classification verdicts
//!
//! An uploaded file exists between upload and confirmation; confirming it
//! consumes the record and creates a Job.

use crate::models::ContentType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

/// One raw prediction from the learned audio event model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    /// 0-100
    pub confidence: f64,
}

/// Classification outcome for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub label: ContentType,
    /// Per-sampling-point labels in sampling order
    pub per_sample: Vec<ContentType>,
    /// Vote counts per label
    pub tally: BTreeMap<ContentType, usize>,
    /// 0-100
    pub confidence: f64,
    /// Top raw predictions when a model-backed classifier produced the
    /// verdict; empty for the heuristic path
    pub top_predictions: Vec<LabelScore>,
}

/// File awaiting confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_id: String,
    pub original_filename: String,
    pub stored_path: PathBuf,
    /// None when classification failed; the caller must then choose
    pub detected: Option<Verdict>,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedFile {
    pub fn new(original_filename: String, stored_path: PathBuf, detected: Option<Verdict>) -> Self {
        let full = Uuid::new_v4().simple().to_string();
        Self {
            file_id: full[..8].to_string(),
            original_filename,
            stored_path,
            detected,
            uploaded_at: Utc::now(),
        }
    }
}
