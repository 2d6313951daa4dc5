//! shelfscan server entry point.
//!
//! Loads configuration and the URL registry once, wires the price search
//! pipeline, and serves it over HTTP. Logs are JSON on stderr.

use anyhow::{Context, Result};
use shelfscan_client::PriceSearch;
use shelfscan_core::{AppConfig, UrlRegistry};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let registry = UrlRegistry::load(&config.registry_path)?;
    let search = PriceSearch::from_config(&config, registry)?;

    let app = handler::router(handler::AppState::new(search), config.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %config.bind_addr,
        max_concurrency = config.max_concurrency,
        timeout_ms = config.timeout_ms,
        "Starting shelfscan server"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
