//! API error handling
//!
//! Component errors convert into [`AppError`], which owns the mapping to
//! status codes and the `{"code", "message", "details"}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cuidapet_core::StoreError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::directory::DirectoryError;
use crate::auth::jwt::JwtError;
use crate::auth::middleware::AccessError;
use crate::auth::password::PasswordError;
use crate::auth::profiles::RegistrarError;
use crate::auth::service::AuthServiceError;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Required fields missing or empty
    Validation { fields: Vec<String> },
    BadRequest(String),
    InvalidRole(String),
    RoleMismatch(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    Internal(String),
    Database(String),
}

impl AppError {
    pub fn validation(mut fields: Vec<String>) -> Self {
        fields.sort();
        fields.dedup();
        AppError::Validation { fields }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Validation { fields } => (
                StatusCode::BAD_REQUEST,
                ApiError::new(
                    "VALIDATION_ERROR",
                    format!("Missing required fields: {}", fields.join(", ")),
                )
                .with_details(serde_json::json!({ "fields": fields })),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::InvalidRole(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("INVALID_ROLE", msg))
            }
            AppError::RoleMismatch(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("ROLE_MISMATCH", msg))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ApiError::new("CONFLICT", msg)),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ApiError::new("UNAUTHORIZED", msg))
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, ApiError::new("FORBIDDEN", msg)),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("INTERNAL_ERROR", "Internal server error"),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("DATABASE_ERROR", "Database operation failed"),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::validation(
            errors
                .field_errors()
                .keys()
                .map(|field| field.to_string())
                .collect(),
        )
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(constraint) => {
                tracing::warn!(constraint = %constraint, "Unique constraint violated");
                AppError::Conflict("Record already exists".to_string())
            }
            StoreError::Database(msg) | StoreError::Corrupt(msg) => AppError::Database(msg),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingError(_)
            | JwtError::SystemTimeError(_)
            | JwtError::LifetimeOverflow(_) => {
                AppError::Internal(err.to_string())
            }
            _ => AppError::Unauthorized("Invalid or expired token".to_string()),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::InvalidRole(_) => AppError::InvalidRole(err.to_string()),
            DirectoryError::DuplicateUsername(_) => AppError::Conflict(err.to_string()),
            DirectoryError::Password(e) => e.into(),
            DirectoryError::Store(e) => e.into(),
        }
    }
}

impl From<RegistrarError> for AppError {
    fn from(err: RegistrarError) -> Self {
        match err {
            RegistrarError::UserNotFound(_) => AppError::NotFound(err.to_string()),
            RegistrarError::RoleMismatch { .. } => AppError::RoleMismatch(err.to_string()),
            RegistrarError::ProfileAlreadyExists { .. } => AppError::Conflict(err.to_string()),
            RegistrarError::Directory(e) => e.into(),
            RegistrarError::Store(e) => e.into(),
        }
    }
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::InvalidCredentials | AuthServiceError::WrongCurrentPassword => {
                AppError::Unauthorized(err.to_string())
            }
            AuthServiceError::UserNotFound(_) => AppError::NotFound(err.to_string()),
            AuthServiceError::Directory(e) => e.into(),
            AuthServiceError::Token(e) => e.into(),
        }
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::InsufficientRole { .. } => AppError::Forbidden(err.to_string()),
            AccessError::MissingToken | AccessError::InvalidToken(_) => {
                AppError::Unauthorized(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuidapet_core::{Role, UserId};

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_unique_violation_hides_constraint_name() {
        let err: AppError = StoreError::UniqueViolation("usuario_nombre_key".into()).into();
        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
        assert_eq!(body["message"], "Record already exists");
        assert!(!body.to_string().contains("usuario_nombre_key"));
    }

    #[tokio::test]
    async fn test_token_lifetime_overflow_is_internal() {
        let (status, body) = body_of(JwtError::LifetimeOverflow(u64::MAX).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let (status, body) =
            body_of(AppError::validation(vec!["role".into(), "password".into()])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["fields"], serde_json::json!(["password", "role"]));
    }

    #[tokio::test]
    async fn test_database_error_is_generic() {
        let (status, body) = body_of(AppError::from(StoreError::Database(
            "relation \"usuario\" does not exist".to_string(),
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DATABASE_ERROR");
        assert!(!body.to_string().contains("usuario"));
    }

    #[tokio::test]
    async fn test_domain_error_mapping() {
        let cases = [
            (
                AppError::from(DirectoryError::InvalidRole("admin".into())),
                StatusCode::BAD_REQUEST,
                "INVALID_ROLE",
            ),
            (
                AppError::from(DirectoryError::DuplicateUsername("ana".into())),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                AppError::from(RegistrarError::RoleMismatch {
                    expected: Role::Client,
                    actual: Role::Employee,
                }),
                StatusCode::BAD_REQUEST,
                "ROLE_MISMATCH",
            ),
            (
                AppError::from(RegistrarError::UserNotFound(UserId(3))),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                AppError::from(AuthServiceError::InvalidCredentials),
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
            (
                AppError::from(JwtError::ExpiredToken),
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
        ];

        for (err, expected_status, expected_code) in cases {
            let (status, body) = body_of(err).await;
            assert_eq!(status, expected_status);
            assert_eq!(body["code"], expected_code);
        }
    }

    #[tokio::test]
    async fn test_token_failures_share_one_message() {
        let (_, expired) = body_of(JwtError::ExpiredToken.into()).await;
        let (_, forged) = body_of(JwtError::InvalidSignature.into()).await;
        assert_eq!(expired, forged);
    }
}
