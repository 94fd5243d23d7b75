//! API route definitions

use crate::auth::{access_control, AccessGuard, AccessPolicy, TokenService};
use crate::handlers::{auth, profiles, users};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use cuidapet_core::Role;
use std::sync::Arc;

/// Legacy password change path, as it appears on the wire
///
/// Request paths are matched percent-encoded, so the `ñ` is spelled out.
pub const LEGACY_CHANGE_PASSWORD_PATH: &str = "/cambiar_contrase%C3%B1a";

/// Create API v1 routes
pub fn api_routes(tokens: Arc<TokenService>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler));

    // Any valid session
    let session_routes = Router::new()
        .route("/auth/password", put(auth::change_password_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/profiles/client", post(profiles::register_client))
        .route_layer(middleware::from_fn_with_state(
            AccessGuard::new(AccessPolicy::authenticated(), tokens.clone()),
            access_control,
        ));

    // programador only
    let programmer_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/profiles/employee", post(profiles::register_employee))
        .route("/profiles/programmer", post(profiles::register_programmer))
        .route_layer(middleware::from_fn_with_state(
            AccessGuard::new(AccessPolicy::require_role(Role::Programmer), tokens),
            access_control,
        ));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(programmer_routes)
}

/// Root-level paths kept for existing clients
pub fn legacy_routes(tokens: Arc<TokenService>) -> Router<Arc<AppState>> {
    let public_routes = Router::new()
        .route("/login", post(auth::login_handler))
        .route("/registrar", post(auth::register_handler));

    let session_routes = Router::new()
        .route(LEGACY_CHANGE_PASSWORD_PATH, put(auth::change_password_handler))
        .route("/registrar_cliente", post(profiles::register_client))
        .route_layer(middleware::from_fn_with_state(
            AccessGuard::new(AccessPolicy::authenticated(), tokens.clone()),
            access_control,
        ));

    let programmer_routes = Router::new()
        .route("/obtener_usuarios", get(users::list_users))
        .route("/registrar_empleado", post(profiles::register_employee))
        .route("/registrar_programador", post(profiles::register_programmer))
        .route_layer(middleware::from_fn_with_state(
            AccessGuard::new(AccessPolicy::require_role(Role::Programmer), tokens),
            access_control,
        ));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(programmer_routes)
}
