//! CuidaPet API - REST server
//!
//! Account registration, login, password changes and role-specific
//! profiles for the CuidaPet platform.

pub mod audit;
pub mod auth;
pub mod docs;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::handlers::health;
use crate::state::AppState;

/// Build the full application router over `state`
pub fn create_router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::prometheus_metrics))
        .route("/api-docs/openapi.json", get(health::openapi_json))
        .nest("/api/v1", routes::api_routes(state.tokens.clone()))
        .merge(routes::legacy_routes(state.tokens.clone()))
        .layer(axum::middleware::from_fn(middleware::metrics_middleware))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Signing key used by the test router
#[cfg(any(test, feature = "test-utils"))]
pub const TEST_JWT_SECRET: &str = "cuidapet-test-secret";

/// Router and state over a fresh in-memory store with cheap hashing
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    use cuidapet_core::{AppConfig, MemoryStore, PasswordConfig, StoreBackend};

    let mut config = AppConfig::default();
    config.database.backend = StoreBackend::Memory;
    config.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    config.auth.password = PasswordConfig::fast();

    let state = Arc::new(
        AppState::new(config, Arc::new(MemoryStore::new())).expect("test password params"),
    );
    (create_router(state.clone()), state)
}

/// Router over a fresh in-memory store
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    create_test_app().0
}
