//! jexi-ap - Audio Processing Backend
//!
//! Ingests uploaded audio, classifies music vs. speech, and runs the
//! matching processing pipeline (stem separation + lyrics + analysis, or
//! noise reduction + transcription + export) as background jobs with
//! pollable progress.

use anyhow::Result;
use clap::Parser;
use jexi_ap::config::AppConfig;
use jexi_ap::engines::EngineSet;
use jexi_ap::services::ResultStore;
use jexi_ap::AppState;
use jexi_common::events::EventBus;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "jexi-ap", version, about = "Jexi audio processing backend")]
struct Args {
    /// Root data folder (uploads/ and processed/ live beneath it)
    #[arg(long)]
    data_folder: Option<String>,

    /// Bind address, e.g. 127.0.0.1:5000
    #[arg(long, env = "JEXI_LISTEN_ADDR")]
    listen: Option<String>,

    /// Path to a TOML config file
    #[arg(long, env = "JEXI_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting jexi-ap (Audio Processing) backend");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Config file: explicit flag first, then the platform default location
    let mut config = match &args.config {
        Some(path) => AppConfig::load(std::path::Path::new(path))?,
        None => match jexi_common::config::find_config_file() {
            Ok(path) => {
                info!("Config: {}", path.display());
                AppConfig::load(&path)?
            }
            Err(_) => AppConfig::default(),
        },
    };

    // Data folder resolution: CLI arg > env var > config file > OS default.
    // An explicitly passed --config file's data_folder key already landed
    // in `config`, so only the higher-priority sources override it here.
    let explicit_config_folder = args.config.is_some()
        && args.data_folder.is_none()
        && std::env::var("JEXI_DATA_FOLDER").is_err();
    if !explicit_config_folder {
        config.data_folder = jexi_common::config::resolve_data_folder(
            args.data_folder.as_deref(),
            "JEXI_DATA_FOLDER",
            Some("data_folder"),
        )?;
    }
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }

    std::fs::create_dir_all(config.uploads_dir())?;
    info!("Data folder: {}", config.data_folder.display());

    // Probe PATH for the external inference engines
    let engines = EngineSet::detect();

    let store = ResultStore::new(config.processed_dir())?;
    let event_bus = EventBus::new(100);
    let listen_addr = config.listen_addr.clone();

    let state = AppState::new(config, engines, store, event_bus);
    let app = jexi_ap::build_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("Listening on http://{}", listen_addr);
    info!("Health check: http://{}/health", listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
