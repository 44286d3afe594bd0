//! In-memory job registry
//!
//! Process-wide mapping from job id to transient job state, owned by
//! AppState and lock-guarded for concurrent pipeline writers and polling
//! readers. The registry is authoritative while a job is processing; once
//! the terminal metadata record is persisted the entry is removed and the
//! result store takes over.

use crate::models::{ContentType, Job, JobId, JobStatus};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, Job>> {
        self.jobs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, Job>> {
        self.jobs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Allocate a fresh job in pending state
    pub fn create_job(&self, content_type: ContentType, source_file: PathBuf) -> Job {
        let job = Job::new(content_type, source_file);
        self.write().insert(job.id.clone(), job.clone());
        tracing::info!(job_id = %job.id, content_type = %content_type, "Job created");
        job
    }

    pub fn get(&self, job_id: &JobId) -> Option<Job> {
        self.read().get(job_id).cloned()
    }

    pub fn get_status(&self, job_id: &JobId) -> Option<JobStatus> {
        self.read().get(job_id).map(|job| job.status)
    }

    /// Transition a job's status; terminal states stay put
    pub fn set_status(&self, job_id: &JobId, status: JobStatus) -> bool {
        match self.write().get_mut(job_id) {
            Some(job) => job.transition_to(status),
            None => false,
        }
    }

    /// Drop the in-memory entry once the durable record owns the job
    pub fn remove(&self, job_id: &JobId) -> Option<Job> {
        self.write().remove(job_id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn create_and_fetch() {
        let registry = JobRegistry::new();
        let job = registry.create_job(ContentType::Music, PathBuf::from("/tmp/a.mp3"));

        let fetched = registry.get(&job.id).unwrap();
        assert_eq!(fetched.status, JobStatus::Pending);
        assert_eq!(fetched.content_type, ContentType::Music);
    }

    #[test]
    fn unknown_id_is_none() {
        let registry = JobRegistry::new();
        assert!(registry.get(&JobId::from("ffffffff")).is_none());
        assert!(registry.get_status(&JobId::from("ffffffff")).is_none());
        assert!(!registry.set_status(&JobId::from("ffffffff"), JobStatus::Processing));
    }

    #[test]
    fn status_transitions_respect_terminal_states() {
        let registry = JobRegistry::new();
        let job = registry.create_job(ContentType::Speech, PathBuf::from("/tmp/a.wav"));

        assert!(registry.set_status(&job.id, JobStatus::Processing));
        assert!(registry.set_status(&job.id, JobStatus::Failed));
        // Terminal: further transitions are rejected
        assert!(!registry.set_status(&job.id, JobStatus::Completed));
        assert_eq!(registry.get_status(&job.id), Some(JobStatus::Failed));
    }

    #[test]
    fn remove_hands_authority_to_disk() {
        let registry = JobRegistry::new();
        let job = registry.create_job(ContentType::Music, PathBuf::from("/tmp/a.mp3"));
        assert_eq!(registry.len(), 1);

        let removed = registry.remove(&job.id).unwrap();
        assert_eq!(removed.id, job.id);
        assert!(registry.is_empty());
        assert!(registry.get(&job.id).is_none());
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let registry = Arc::new(JobRegistry::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(std::thread::spawn(move || {
                let job = registry.create_job(ContentType::Speech, PathBuf::from("/tmp/x"));
                for _ in 0..100 {
                    let _ = registry.get(&job.id);
                }
                registry.set_status(&job.id, JobStatus::Processing);
                registry.set_status(&job.id, JobStatus::Completed);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 8);
    }
}
