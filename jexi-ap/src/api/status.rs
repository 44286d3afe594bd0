//! Status polling endpoint
//!
//! Two-tier lookup: the in-memory registry is authoritative while a job
//! is processing; once terminal (or after a restart) the persisted record
//! is the sole source of truth.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ApiResult;
use crate::models::{JobId, JobStatus};
use crate::services::StatusSummary;
use crate::AppState;

/// GET /api/status/{job_id} response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub job_id: JobId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<i8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    fn bare(status: &'static str, job_id: JobId) -> Self {
        Self {
            status,
            job_id,
            percent: None,
            message: None,
            updated_at: None,
            error: None,
        }
    }
}

/// GET /api/status/{job_id}
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let job_id = JobId::from(job_id);

    // Tier 1: in-memory registry while the job is live
    if let Some(job) = state.registry.get(&job_id) {
        let progress = state.progress.get(&job_id);
        let response = match job.status {
            JobStatus::Pending | JobStatus::Processing => StatusResponse {
                status: "processing",
                job_id,
                percent: progress.as_ref().map(|p| p.percent),
                message: progress.as_ref().map(|p| p.message.clone()),
                updated_at: progress.as_ref().map(|p| p.updated_at),
                error: None,
            },
            JobStatus::Completed => StatusResponse::bare("completed", job_id),
            // Terminal entry still in memory: the durable record could not
            // be written, so the progress message carries the error
            JobStatus::Failed => StatusResponse {
                error: progress.as_ref().map(|p| p.message.clone()),
                ..StatusResponse::bare("failed", job_id)
            },
        };
        return Ok(Json(response));
    }

    // Tier 2: durable record
    let response = match state.store.get_status(&job_id) {
        StatusSummary::NotFound => StatusResponse {
            message: Some("Job ID not found".to_string()),
            ..StatusResponse::bare("not_found", job_id)
        },
        StatusSummary::Processing => StatusResponse::bare("processing", job_id),
        StatusSummary::Completed => StatusResponse {
            message: Some("Processing complete".to_string()),
            ..StatusResponse::bare("completed", job_id)
        },
        StatusSummary::Failed { error } => StatusResponse {
            error: Some(error),
            ..StatusResponse::bare("failed", job_id)
        },
    };

    Ok(Json(response))
}

/// Build status routes
pub fn status_routes() -> Router<AppState> {
    Router::new().route("/api/status/:job_id", get(get_job_status))
}
