use anyhow::Result;
use std::sync::Arc;

mod config;
mod error;
mod logging;
mod routes;
mod services;
pub mod models;

use services::{analysis::AnalysisService, content_rules::ContentPolicy, store::AnalysisStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::Config::from_env()?;

    let store = Arc::new(AnalysisStore::open(&config.database)?);
    let service = AnalysisService::new(store, ContentPolicy::new(config.forbidden_content.clone()));

    // Build our application state
    let addr = config.addr;
    let state = Arc::new(AppState::new(config, service));

    let app = routes::router(state);

    // Run it
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

// Application state
pub struct AppState {
    config: config::Config,
    service: AnalysisService,
}

impl AppState {
    fn new(config: config::Config, service: AnalysisService) -> Self {
        Self { config, service }
    }
}
