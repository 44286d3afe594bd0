//! Artifact download endpoint
//!
//! Serves job artifacts by whitelisted name; anything outside the known
//! artifact set (including traversal attempts) is a 404.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::error::{ApiError, ApiResult};
use crate::models::JobId;
use crate::AppState;

/// GET /api/download/{job_id}/{artifact}
pub async fn download_artifact(
    State(state): State<AppState>,
    Path((job_id, artifact)): Path<(String, String)>,
) -> ApiResult<Response> {
    let job_id = JobId::from(job_id);

    let path = state
        .store
        .artifact_path(&job_id, &artifact)
        .ok_or_else(|| {
            ApiError::NotFound(format!("Artifact not found: {}/{}", job_id, artifact))
        })?;

    let bytes = tokio::fs::read(&path).await?;
    let content_type = match path.extension().and_then(|e| e.to_str()) {
        Some("wav") => "audio/wav",
        Some("json") => "application/json",
        Some("srt") => "application/x-subrip",
        _ => "text/plain; charset=utf-8",
    };

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Build download routes
pub fn download_routes() -> Router<AppState> {
    Router::new().route("/api/download/:job_id/*artifact", get(download_artifact))
}
