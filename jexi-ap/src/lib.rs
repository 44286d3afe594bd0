//! jexi-ap library interface
//!
//! Exposes the application state and router builder for integration
//! testing.

pub mod api;
pub mod config;
pub mod engines;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::error::{ApiError, ApiResult};

use crate::config::AppConfig;
use crate::engines::EngineSet;
use crate::services::{JobRegistry, ProgressTracker, ResultStore, UploadRegistry};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use jexi_common::events::EventBus;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// External inference engines behind per-instance locks
    pub engines: EngineSet,
    /// Files awaiting confirmation
    pub uploads: Arc<UploadRegistry>,
    /// In-memory job state, authoritative while processing
    pub registry: Arc<JobRegistry>,
    /// Per-job progress records
    pub progress: Arc<ProgressTracker>,
    /// Durable results, authoritative once terminal
    pub store: Arc<ResultStore>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        engines: EngineSet,
        store: ResultStore,
        event_bus: EventBus,
    ) -> Self {
        Self {
            config: Arc::new(config),
            engines,
            uploads: Arc::new(UploadRegistry::new()),
            registry: Arc::new(JobRegistry::new()),
            progress: Arc::new(ProgressTracker::new()),
            store: Arc::new(store),
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    // Multipart framing overhead on top of the raw file bound
    let body_limit = state.config.max_upload_bytes + 1024 * 1024;

    Router::new()
        .merge(api::health_routes())
        .merge(api::upload_routes())
        .merge(api::job_routes())
        .merge(api::status_routes())
        .merge(api::result_routes())
        .merge(api::download_routes())
        .route("/events", get(api::event_stream))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
