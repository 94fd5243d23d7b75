//! CuidaPet API Server
//!
//! REST API server for CuidaPet accounts and role profiles.

use cuidapet_api::{create_router, state::AppState};
use cuidapet_core::{open_store, AppConfig, LoggingConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", logging.level)));

    if logging.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    if config.uses_development_secret() {
        tracing::warn!("JWT_SECRET is not set; using the built-in development secret");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let store = open_store(&config.database).await?;
    let state = Arc::new(AppState::new(config, store)?);

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("CuidaPet API Server starting on http://{}", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
