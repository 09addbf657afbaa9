//! soundpool-si - Sample Ingest Microservice
//!
//! Accepts audio samples from capture clients over HTTP and files them into
//! the on-disk dataset: attributed training samples under
//! `<root>/training/<speaker>/`, unattributed recognition samples in the
//! flat `<root>/recognition/` pool.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use soundpool_si::config::{CliArgs, ServiceConfig};
use soundpool_si::ingest::IngestStore;
use soundpool_si::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = ServiceConfig::resolve(&args)?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting soundpool-si (Sample Ingest) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Dataset root: {}", config.root.display());

    // The dataset root must be creatable and writable now, not on the first
    // upload
    let store = IngestStore::open(&config.root, &config.extension)?;

    let state = AppState::new(store);
    let app = soundpool_si::build_router(state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
