//! Acervo Server
//!
//! HTTP API for the document catalog: ingestion of multipart submissions,
//! catalog listing and querying, single-document export, and .docx decoding.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use acervo_extractor::DocxExtractor;
use acervo_ingest::{FsImageStore, ImageStoreError, IngestionPipeline};
use acervo_store::{SqliteStore, StoreError};
use config::ServerConfig;
use handlers::{create_router, AppState};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The document store could not be opened
    #[error("Failed to open document store: {0}")]
    Store(#[from] StoreError),

    /// The image directory could not be prepared
    #[error("Failed to prepare image directory: {0}")]
    Images(#[from] ImageStoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Open the store and image directory and assemble the application state
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let store = Arc::new(Mutex::new(SqliteStore::new(&config.database_path)?));
    let images = FsImageStore::new(&config.image_dir, config.image_base_url.as_str())?;
    let pipeline = IngestionPipeline::new(
        DocxExtractor::new(config.extractor.clone()),
        store,
        images,
        config.ingest.clone(),
    );
    Ok(AppState::new(pipeline))
}

/// Install the fmt subscriber, filtered by `RUST_LOG` (default `info`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed, e.g. by a test harness
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Start the catalog HTTP server
///
/// Validates configuration, opens the store and image directory, and serves
/// until Ctrl-C.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    init_tracing();
    config.validate()?;

    info!("Starting Acervo server");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.database_path);
    info!("Images: {} (served under {})", config.image_dir, config.image_base_url);
    if config.database_path == ":memory:" {
        warn!("Using an in-memory database; documents will not survive a restart");
    }

    let state = build_state(&config)?;
    let app = create_router(state, config.max_upload_bytes);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
