//! Shared pipeline lifecycle plumbing
//!
//! Both pipeline variants terminate the same way: exactly one metadata
//! record persisted per job, progress cleared, and the in-memory registry
//! entry dropped once the durable record holds authority.

use crate::models::progress::ERROR_PERCENT;
use crate::models::{FailureResult, JobId, JobMetadata, JobStatus};
use crate::services::{JobRegistry, ProgressTracker, ResultStore};
use chrono::Utc;
use jexi_common::events::{EventBus, JobEvent};
use std::sync::Arc;

/// Services every pipeline run touches
#[derive(Clone)]
pub struct PipelineContext {
    pub registry: Arc<JobRegistry>,
    pub progress: Arc<ProgressTracker>,
    pub store: Arc<ResultStore>,
    pub event_bus: EventBus,
}

impl PipelineContext {
    /// Record progress and broadcast it
    pub fn update_progress(&self, job_id: &JobId, percent: i8, message: &str) {
        self.progress.update(job_id, percent, message);
        self.event_bus.emit_lossy(JobEvent::JobProgress {
            job_id: job_id.to_string(),
            percent,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Terminate a job successfully
    ///
    /// A metadata record that cannot be persisted turns the job into a
    /// failure; a completed job without a durable record would otherwise
    /// vanish from status lookups after the registry entry drops.
    pub fn complete(&self, job_id: &JobId, metadata: JobMetadata) -> JobMetadata {
        let content_type = match &metadata {
            JobMetadata::Music(_) => "music",
            JobMetadata::Speech(_) => "speech",
            JobMetadata::Failure(_) => "unknown",
        };

        if let Err(e) = self.store.save_metadata(&metadata) {
            return self.fail(job_id, anyhow::Error::new(e).context("Persisting metadata"));
        }

        self.update_progress(job_id, 100, "Processing complete!");
        self.registry.set_status(job_id, JobStatus::Completed);
        self.progress.clear(job_id);
        self.registry.remove(job_id);

        self.event_bus.emit_lossy(JobEvent::JobCompleted {
            job_id: job_id.to_string(),
            content_type: content_type.to_string(),
            timestamp: Utc::now(),
        });

        tracing::info!(job_id = %job_id, content_type = content_type, "Job completed");
        metadata
    }

    /// Terminate a job as failed
    ///
    /// Partial artifacts from completed stages stay on disk.
    pub fn fail(&self, job_id: &JobId, error: anyhow::Error) -> JobMetadata {
        tracing::error!(job_id = %job_id, error = %error, "Pipeline failed");

        self.update_progress(job_id, ERROR_PERCENT, &format!("Error: {}", error));
        self.registry.set_status(job_id, JobStatus::Failed);

        let metadata =
            JobMetadata::Failure(FailureResult::new(job_id.clone(), error.to_string()));

        match self.store.save_metadata(&metadata) {
            Ok(()) => {
                self.progress.clear(job_id);
                self.registry.remove(job_id);
            }
            Err(persist_err) => {
                // Keep the in-memory entry: it is the only remaining
                // record of this job's failure
                tracing::error!(
                    job_id = %job_id,
                    error = %persist_err,
                    "Could not persist failure record; keeping in-memory state"
                );
            }
        }

        self.event_bus.emit_lossy(JobEvent::JobFailed {
            job_id: job_id.to_string(),
            error: error.to_string(),
            timestamp: Utc::now(),
        });

        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;
    use crate::services::result_store::StatusSummary;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn context() -> (TempDir, PipelineContext) {
        let dir = TempDir::new().unwrap();
        let ctx = PipelineContext {
            registry: Arc::new(JobRegistry::new()),
            progress: Arc::new(ProgressTracker::new()),
            store: Arc::new(ResultStore::new(dir.path().join("processed")).unwrap()),
            event_bus: EventBus::new(16),
        };
        (dir, ctx)
    }

    #[test]
    fn fail_persists_record_and_clears_transient_state() {
        let (_guard, ctx) = context();
        let job = ctx
            .registry
            .create_job(ContentType::Music, PathBuf::from("/tmp/a.mp3"));

        let metadata = ctx.fail(&job.id, anyhow::anyhow!("separation blew up"));
        assert_eq!(metadata.status(), JobStatus::Failed);

        // Durable record holds the failure
        assert_eq!(
            ctx.store.get_status(&job.id),
            StatusSummary::Failed {
                error: "separation blew up".to_string()
            }
        );
        // Transient state is gone
        assert!(ctx.registry.get(&job.id).is_none());
        assert!(ctx.progress.get(&job.id).is_none());
    }

    #[test]
    fn repeated_status_reads_after_failure_are_identical() {
        let (_guard, ctx) = context();
        let job = ctx
            .registry
            .create_job(ContentType::Speech, PathBuf::from("/tmp/a.wav"));
        ctx.fail(&job.id, anyhow::anyhow!("boom"));

        let first = ctx.store.get_status(&job.id);
        let second = ctx.store.get_status(&job.id);
        assert_eq!(first, second);
    }
}
