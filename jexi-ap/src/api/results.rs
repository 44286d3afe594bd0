//! Results endpoint
//!
//! Returns completed-job metadata with download URLs for every output
//! artifact. Music jobs list one URL per stem tagged active/inactive;
//! speech jobs list the cleaned audio plus three transcript exports.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    ContentType, JobId, JobMetadata, JobStatus, Lyrics, MusicResult, SpeechResult, StemName,
    Transcript,
};
use crate::AppState;

/// One downloadable stem
#[derive(Debug, Serialize)]
pub struct StemDownload {
    pub url: String,
    pub active: bool,
}

/// GET /api/results/{job_id} response for a music job
#[derive(Debug, Serialize)]
pub struct MusicResultsResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub content_type: ContentType,
    pub filename: String,
    pub key: String,
    pub bpm: u32,
    pub duration: String,
    pub sample_rate: u32,
    pub lyrics: Lyrics,
    pub stems: BTreeMap<StemName, StemDownload>,
    pub processed_at: DateTime<Utc>,
}

/// Download URLs for a speech job's artifacts
#[derive(Debug, Serialize)]
pub struct SpeechDownloads {
    pub clean_audio: String,
    pub transcript_txt: String,
    pub transcript_json: String,
    pub transcript_srt: String,
}

/// GET /api/results/{job_id} response for a speech job
#[derive(Debug, Serialize)]
pub struct SpeechResultsResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub content_type: ContentType,
    pub filename: String,
    pub duration: String,
    pub sample_rate: u32,
    pub transcript: Transcript,
    pub downloads: SpeechDownloads,
    pub processed_at: DateTime<Utc>,
}

/// GET /api/results/{job_id} response for a failed job
#[derive(Debug, Serialize)]
pub struct FailedResultsResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub error: String,
    pub processed_at: DateTime<Utc>,
}

/// GET /api/results/{job_id}
pub async fn get_job_results(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let job_id = JobId::from(job_id);

    let metadata = state
        .store
        .get_metadata(&job_id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let Some(metadata) = metadata else {
        // Still running jobs have no durable record yet
        if state.registry.get(&job_id).is_some() {
            return Err(ApiError::BadRequest(format!(
                "Job is still processing: {}",
                job_id
            )));
        }
        return Err(ApiError::NotFound(format!("Job not found: {}", job_id)));
    };

    let response = match metadata {
        JobMetadata::Music(result) => Json(music_response(&job_id, result)).into_response(),
        JobMetadata::Speech(result) => Json(speech_response(&job_id, result)).into_response(),
        JobMetadata::Failure(result) => Json(FailedResultsResponse {
            job_id: result.job_id,
            status: result.status,
            error: result.error,
            processed_at: result.processed_at,
        })
        .into_response(),
    };

    Ok(response)
}

fn download_url(job_id: &JobId, artifact: &str) -> String {
    format!("/api/download/{}/{}", job_id, artifact)
}

fn music_response(job_id: &JobId, result: MusicResult) -> MusicResultsResponse {
    let stems = result
        .stems
        .iter()
        .map(|(name, info)| {
            (
                *name,
                StemDownload {
                    url: download_url(job_id, &format!("stems/{}.wav", name)),
                    active: info.active,
                },
            )
        })
        .collect();

    MusicResultsResponse {
        job_id: result.job_id,
        status: result.status,
        content_type: result.content_type,
        filename: result.filename,
        key: result.key,
        bpm: result.bpm,
        duration: result.duration,
        sample_rate: result.sample_rate,
        lyrics: result.lyrics,
        stems,
        processed_at: result.processed_at,
    }
}

fn speech_response(job_id: &JobId, result: SpeechResult) -> SpeechResultsResponse {
    SpeechResultsResponse {
        job_id: result.job_id,
        status: result.status,
        content_type: result.content_type,
        filename: result.filename,
        duration: result.duration,
        sample_rate: result.sample_rate,
        transcript: result.transcript,
        downloads: SpeechDownloads {
            clean_audio: download_url(job_id, "clean_audio.wav"),
            transcript_txt: download_url(job_id, "transcript.txt"),
            transcript_json: download_url(job_id, "transcript.json"),
            transcript_srt: download_url(job_id, "transcript.srt"),
        },
        processed_at: result.processed_at,
    }
}

/// Build results routes
pub fn result_routes() -> Router<AppState> {
    Router::new().route("/api/results/:job_id", get(get_job_results))
}
