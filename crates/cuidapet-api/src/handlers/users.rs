//! User listing

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::models::{UserListResponse, UserResponse};
use crate::error::AppError;
use crate::state::AppState;

/// List every user, ordered by id
///
/// Restricted to `programador`. Credentials are never included.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = UserListResponse),
        (status = 401, description = "Invalid token", body = crate::error::ApiError),
        (status = 403, description = "Requires role programador", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UserListResponse>, AppError> {
    let users: Vec<UserResponse> = state
        .auth
        .directory()
        .list_all()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(UserListResponse {
        total: users.len(),
        users,
    }))
}
