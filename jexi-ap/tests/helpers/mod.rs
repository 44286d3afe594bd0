//! Test helper utilities
//!
//! Shared fixtures for integration testing: synthetic audio generation,
//! mock inference engines, and app state builders.

// Each test binary compiles this module; not all of them use every helper
#![allow(dead_code)]

pub mod audio_generator;
pub mod mock_engines;

use jexi_ap::config::AppConfig;
use jexi_ap::engines::EngineSet;
use jexi_ap::services::{PipelineContext, ResultStore};
use jexi_ap::AppState;
use jexi_common::events::EventBus;
use tempfile::TempDir;

/// Build an AppState rooted in a fresh temp folder
///
/// The returned TempDir guard must outlive the state.
pub fn test_state(engines: EngineSet) -> (TempDir, AppState) {
    let dir = TempDir::new().expect("temp dir");
    let mut config = AppConfig::default();
    config.data_folder = dir.path().to_path_buf();

    std::fs::create_dir_all(config.uploads_dir()).expect("uploads dir");
    let store = ResultStore::new(config.processed_dir()).expect("result store");

    let state = AppState::new(config, engines, store, EventBus::new(64));
    (dir, state)
}

/// Pipeline context borrowing an AppState's services
pub fn pipeline_context(state: &AppState) -> PipelineContext {
    PipelineContext {
        registry: state.registry.clone(),
        progress: state.progress.clone(),
        store: state.store.clone(),
        event_bus: state.event_bus.clone(),
    }
}
