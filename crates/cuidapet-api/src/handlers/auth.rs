//! Authentication API handlers
//!
//! Login, registration, password change and the current-user view.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::auth::models::{
    ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest, UserResponse,
};
use crate::auth::{AuthServiceError, SessionUser};
use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::state::AppState;

/// Login with username and password
///
/// Unknown usernames and wrong passwords produce the same 401 response.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = crate::auth::models::LoginResponse),
        (status = 400, description = "Missing fields", body = crate::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = request.username.unwrap_or_default();
    let password = request.password.unwrap_or_default();
    let context = AuditContext::from_headers(&headers);

    match state.auth.login(&username, &password).await {
        Ok(response) => {
            audit_log(&AuditEvent::LoginSuccess {
                user_id: response.user.id,
                username: response.user.username.clone(),
                role: response.user.role,
                context,
            });
            Ok(Json(response))
        }
        Err(err) => {
            if matches!(err, AuthServiceError::InvalidCredentials) {
                audit_log(&AuditEvent::LoginFailure {
                    username,
                    reason: "invalid credentials".to_string(),
                    context,
                });
            }
            Err(err.into())
        }
    }
}

/// Register a new user account
///
/// Creates the base identity only; the role-specific profile is created
/// through the `/profiles/*` endpoints.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = crate::auth::models::RegisterResponse),
        (status = 400, description = "Missing fields or invalid role", body = crate::error::ApiError),
        (status = 409, description = "Username already taken", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = request.username.unwrap_or_default();
    let password = request.password.unwrap_or_default();
    let role = request.role.unwrap_or_default();
    let context = AuditContext::from_headers(&headers);

    match state.auth.register(&username, &password, &role).await {
        Ok(response) => {
            if let Ok(role) = role.to_lowercase().parse() {
                audit_log(&AuditEvent::RegistrationSuccess {
                    user_id: response.id,
                    username,
                    role,
                    context,
                });
            }
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(err) => {
            audit_log(&AuditEvent::RegistrationFailure {
                username,
                reason: err.to_string(),
                context,
            });
            Err(err.into())
        }
    }
}

/// Change the caller's password
#[utoipa::path(
    put,
    path = "/api/v1/auth/password",
    tag = "auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Missing fields", body = crate::error::ApiError),
        (status = 401, description = "Invalid token or wrong current password", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let current = request.current_password.unwrap_or_default();
    let new = request.new_password.unwrap_or_default();
    let context = AuditContext::from_headers(&headers);

    match state.auth.change_password(user.id, &current, &new).await {
        Ok(()) => {
            audit_log(&AuditEvent::PasswordChange {
                user_id: user.id,
                username: user.username,
                context,
            });
            Ok(Json(MessageResponse::new("Password updated successfully")))
        }
        Err(err) => {
            audit_log(&AuditEvent::PasswordChangeFailure {
                user_id: user.id,
                username: user.username,
                reason: err.to_string(),
                context,
            });
            Err(err.into())
        }
    }
}

/// Current authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Invalid token", body = crate::error::ApiError),
        (status = 404, description = "User no longer exists", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<UserResponse>, AppError> {
    let summary = state.auth.current_user(user.id).await?;
    Ok(Json(summary.into()))
}
