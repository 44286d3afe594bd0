//! Confirmation endpoint
//!
//! Turns an uploaded file into a job. The confirming request returns
//! immediately with the job id; the pipeline runs as its own background
//! task.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::models::{ContentType, Job, JobId};
use crate::services::{MusicPipeline, PipelineContext, SpeechPipeline};
use crate::AppState;

/// POST /api/confirm request
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub file_id: String,
    /// Optional explicit override of the detected content type
    #[serde(default)]
    pub content_type: Option<String>,
}

/// POST /api/confirm response
#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub job_id: JobId,
    pub content_type: ContentType,
    pub estimated_time: &'static str,
    pub status_url: String,
}

/// POST /api/confirm
pub async fn confirm_upload(
    State(state): State<AppState>,
    Json(request): Json<ConfirmRequest>,
) -> ApiResult<Json<ConfirmResponse>> {
    let record = state.uploads.get(&request.file_id).ok_or_else(|| {
        ApiError::NotFound(format!("Uploaded file not found: {}", request.file_id))
    })?;

    // Validate before consuming the record, so a bad override does not
    // burn the single-use file id
    let content_type = match &request.content_type {
        Some(raw) => raw
            .parse::<ContentType>()
            .map_err(ApiError::BadRequest)?,
        None => match &record.detected {
            Some(verdict) => verdict.label,
            None => {
                return Err(ApiError::BadRequest(
                    "Classification failed for this file; content_type is required".to_string(),
                ))
            }
        },
    };

    let Some(record) = state.uploads.take(&request.file_id) else {
        // Lost a race with a concurrent confirmation
        return Err(ApiError::NotFound(format!(
            "Uploaded file not found: {}",
            request.file_id
        )));
    };

    let job = state
        .registry
        .create_job(content_type, record.stored_path.clone());

    state.event_bus.emit_lossy(jexi_common::events::JobEvent::JobStarted {
        job_id: job.id.to_string(),
        content_type: content_type.to_string(),
        timestamp: chrono::Utc::now(),
    });

    let estimated_time = match content_type {
        ContentType::Music => "3-5 minutes",
        ContentType::Speech => "1-2 minutes",
    };

    let response = ConfirmResponse {
        job_id: job.id.clone(),
        content_type,
        estimated_time,
        status_url: format!("/api/status/{}", job.id),
    };

    spawn_pipeline(state, job);

    Ok(Json(response))
}

/// Run the job's pipeline on the blocking pool, one task per job
fn spawn_pipeline(state: AppState, job: Job) {
    tokio::task::spawn_blocking(move || {
        let ctx = PipelineContext {
            registry: state.registry.clone(),
            progress: state.progress.clone(),
            store: state.store.clone(),
            event_bus: state.event_bus.clone(),
        };

        let metadata = match job.content_type {
            ContentType::Music => {
                MusicPipeline::new(ctx, state.engines.clone(), state.config.music.clone())
                    .process(&job.source_file, &job.id)
            }
            ContentType::Speech => {
                SpeechPipeline::new(ctx, state.engines.clone(), state.config.speech.clone())
                    .process(&job.source_file, &job.id)
            }
        };

        tracing::info!(
            job_id = %job.id,
            status = %metadata.status(),
            "Pipeline task finished"
        );
    });
}

/// Build confirmation routes
pub fn job_routes() -> Router<AppState> {
    Router::new().route("/api/confirm", post(confirm_upload))
}
