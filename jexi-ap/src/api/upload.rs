//! Upload endpoint
//!
//! Accepts one audio file, stores it, classifies its content
//! synchronously, and returns a file id awaiting confirmation. No job
//! exists yet; the caller confirms (or overrides) the detected content
//! type first.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::engines::EngineSet;
use crate::error::{ApiError, ApiResult};
use crate::models::{ContentType, LabelScore, UploadedFile, Verdict};
use crate::services::{ContentClassifier, EventModelClassifier};
use crate::AppState;

/// POST /api/upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub filename: String,
    /// None when classification failed; the caller must choose explicitly
    pub detected_content_type: Option<ContentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_predictions: Vec<LabelScore>,
    pub status: &'static str,
}

/// POST /api/upload
pub async fn upload_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut file_part: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        file_part = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) = file_part.ok_or_else(|| {
        ApiError::BadRequest("No file provided".to_string())
    })?;

    if filename.is_empty() {
        return Err(ApiError::BadRequest("No file selected".to_string()));
    }
    if !state.config.extension_allowed(&filename) {
        return Err(ApiError::BadRequest(format!(
            "Invalid file type: {} (allowed: {})",
            filename,
            state.config.allowed_extensions.join(", ")
        )));
    }
    if data.is_empty() {
        return Err(ApiError::BadRequest("Empty file".to_string()));
    }
    if data.len() > state.config.max_upload_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "File exceeds {} bytes",
            state.config.max_upload_bytes
        )));
    }
    // Content sniff: the extension alone is caller-controlled.
    // M4A containers sniff as video/mp4; unknown content is left for the
    // decoder to reject.
    if let Some(kind) = infer::get(&data) {
        let mime = kind.mime_type();
        if !mime.starts_with("audio/") && mime != "video/mp4" {
            return Err(ApiError::BadRequest(format!(
                "File content does not look like audio ({})",
                mime
            )));
        }
    }

    // Store under a unique name; the original filename survives only in
    // the record
    let safe_name = sanitize_filename(&filename);
    let stored_path = state
        .config
        .uploads_dir()
        .join(format!("{}_{}", Uuid::new_v4().simple(), safe_name));
    tokio::fs::write(&stored_path, &data).await?;

    tracing::info!(
        filename = %filename,
        stored = %stored_path.display(),
        bytes = data.len(),
        "File uploaded"
    );

    // Classification runs synchronously on the request path; it is fast
    // relative to the pipelines
    let engines = state.engines.clone();
    let classifier_config = state.config.classifier.clone();
    let classify_path = stored_path.clone();
    let verdict = tokio::task::spawn_blocking(move || {
        classify_upload(&engines, classifier_config, &classify_path)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Classification task failed: {}", e)))?;

    let record = UploadedFile::new(filename.clone(), stored_path, verdict);
    let response = UploadResponse {
        file_id: record.file_id.clone(),
        filename,
        detected_content_type: record.detected.as_ref().map(|v| v.label),
        confidence: record.detected.as_ref().map(|v| v.confidence),
        top_predictions: record
            .detected
            .as_ref()
            .map(|v| v.top_predictions.clone())
            .unwrap_or_default(),
        status: "awaiting_confirmation",
    };

    state.event_bus.emit_lossy(jexi_common::events::JobEvent::FileUploaded {
        file_id: record.file_id.clone(),
        filename: record.original_filename.clone(),
        detected_type: record.detected.as_ref().map(|v| v.label.to_string()),
        timestamp: chrono::Utc::now(),
    });

    state.uploads.insert(record);
    Ok(Json(response))
}

/// Classify with the event model when available, the heuristic otherwise
///
/// A classification failure yields None, never a guessed label.
fn classify_upload(
    engines: &EngineSet,
    config: crate::config::ClassifierConfig,
    path: &Path,
) -> Option<Verdict> {
    if let Some(tag_model) = &engines.tag_model {
        match tag_model.lock().predict(path) {
            Ok(predictions) => {
                return Some(EventModelClassifier::new().categorize(&predictions));
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Event model failed, falling back to heuristic classifier"
                );
            }
        }
    }

    match ContentClassifier::new(config).classify(path) {
        Ok(verdict) => Some(verdict),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Classification failed");
            None
        }
    }
}

/// Keep the base name and replace anything shell- or path-hostile
fn sanitize_filename(filename: &str) -> String {
    let base = PathBuf::from(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/api/upload", post(upload_audio))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_paths_and_specials() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my song (live).mp3"), "my_song__live_.mp3");
        assert_eq!(sanitize_filename("voice.wav"), "voice.wav");
    }
}
