//! Per-job progress records
//!
//! One record per running job, updated at each stage boundary and deleted
//! once the job reaches a terminal state.

use crate::models::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel percent value marking a failed job
pub const ERROR_PERCENT: i8 = -1;

/// Latest progress for one job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub job_id: JobId,
    /// 0-100 while processing, -1 once the pipeline has failed
    pub percent: i8,
    pub message: String,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn new(job_id: JobId, percent: i8, message: impl Into<String>) -> Self {
        Self {
            job_id,
            percent,
            message: message.into(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.percent == ERROR_PERCENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_sentinel_detected() {
        let rec = ProgressRecord::new(JobId::from("ab12cd34"), ERROR_PERCENT, "Error: boom");
        assert!(rec.is_error());

        let rec = ProgressRecord::new(JobId::from("ab12cd34"), 50, "halfway");
        assert!(!rec.is_error());
    }
}
