//! Per-job progress tracking
//!
//! One (percent, message, timestamp) record per running job, overwritten
//! at each stage boundary and cleared when the job reaches a terminal
//! state. Safe under concurrent pipeline writers and polling readers.

use crate::models::{JobId, ProgressRecord};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
pub struct ProgressTracker {
    records: RwLock<HashMap<JobId, ProgressRecord>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, ProgressRecord>> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, ProgressRecord>> {
        self.records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the latest progress for a job
    pub fn update(&self, job_id: &JobId, percent: i8, message: impl Into<String>) {
        let record = ProgressRecord::new(job_id.clone(), percent, message);
        self.write().insert(job_id.clone(), record);
    }

    pub fn get(&self, job_id: &JobId) -> Option<ProgressRecord> {
        self.read().get(job_id).cloned()
    }

    /// Remove tracking once the job is terminal
    pub fn clear(&self, job_id: &JobId) {
        self.write().remove(job_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::progress::ERROR_PERCENT;

    #[test]
    fn update_overwrites_previous_record() {
        let tracker = ProgressTracker::new();
        let id = JobId::from("ab12cd34");

        tracker.update(&id, 10, "Separating audio stems...");
        tracker.update(&id, 70, "Stems separated successfully!");

        let record = tracker.get(&id).unwrap();
        assert_eq!(record.percent, 70);
        assert_eq!(record.message, "Stems separated successfully!");
    }

    #[test]
    fn clear_removes_record() {
        let tracker = ProgressTracker::new();
        let id = JobId::from("ab12cd34");

        tracker.update(&id, 100, "Processing complete!");
        tracker.clear(&id);
        assert!(tracker.get(&id).is_none());
    }

    #[test]
    fn error_sentinel_round_trips() {
        let tracker = ProgressTracker::new();
        let id = JobId::from("dead0001");

        tracker.update(&id, ERROR_PERCENT, "Error: separation failed");
        assert!(tracker.get(&id).unwrap().is_error());
    }

    #[test]
    fn unknown_job_has_no_progress() {
        let tracker = ProgressTracker::new();
        assert!(tracker.get(&JobId::from("ffffffff")).is_none());
    }
}
