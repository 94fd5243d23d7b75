//! Request and response bodies for the auth and profile endpoints
//!
//! Request fields accept both the English names and the legacy Spanish
//! names (`nombre`, `contraseña`, ...). Required fields are `Option` so a
//! missing field surfaces as a validation error naming it, instead of a
//! deserialization failure.

use chrono::NaiveDate;
use cuidapet_core::{ProfileId, Role, UserId, UserSummary};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(alias = "nombre")]
    #[validate(required, length(min = 1))]
    #[schema(example = "ana")]
    pub username: Option<String>,

    #[serde(alias = "contraseña")]
    #[validate(required, length(min = 1))]
    #[schema(example = "pw123")]
    pub password: Option<String>,
}

/// Successful login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[serde(alias = "nombre")]
    #[validate(required, length(min = 1))]
    pub username: Option<String>,

    #[serde(alias = "contraseña")]
    #[validate(required, length(min = 1))]
    pub password: Option<String>,

    /// One of `programador`, `empleado`, `cliente`
    #[serde(alias = "rol")]
    #[validate(required, length(min = 1))]
    #[schema(example = "cliente")]
    pub role: Option<String>,
}

/// Successful registration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    #[schema(value_type = i64)]
    pub id: UserId,
    pub message: String,
    /// Where to complete the role-specific profile
    pub next_step: String,
}

/// Password change request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[serde(alias = "contraseña_actual")]
    #[validate(required, length(min = 1))]
    pub current_password: Option<String>,

    #[serde(alias = "contraseña_nueva")]
    #[validate(required, length(min = 1))]
    pub new_password: Option<String>,
}

/// Generic confirmation body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Public user representation (safe for API responses)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = i64)]
    pub id: UserId,
    pub username: String,
    #[schema(value_type = String, example = "cliente")]
    pub role: Role,
}

impl From<UserSummary> for UserResponse {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

/// User listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: usize,
}

/// Client profile request; `user_id` defaults to the caller
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ClientProfileRequest {
    #[serde(default, alias = "usuario_id")]
    #[schema(value_type = Option<i64>)]
    pub user_id: Option<UserId>,

    #[serde(alias = "direccion")]
    #[validate(required, length(min = 1))]
    pub address: Option<String>,

    #[serde(alias = "telefono")]
    #[validate(required, length(min = 1))]
    pub phone: Option<String>,
}

/// Employee profile request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EmployeeProfileRequest {
    #[serde(alias = "usuario_id")]
    #[validate(required)]
    #[schema(value_type = Option<i64>)]
    pub user_id: Option<UserId>,

    #[serde(alias = "especialidad")]
    #[validate(required, length(min = 1))]
    pub specialty: Option<String>,

    #[serde(alias = "nombre_completo")]
    #[validate(required, length(min = 1))]
    pub full_name: Option<String>,

    #[serde(alias = "dni")]
    #[validate(required, length(min = 1))]
    pub national_id: Option<String>,

    #[serde(alias = "telefono")]
    #[validate(required, length(min = 1))]
    pub phone: Option<String>,

    #[serde(alias = "direccion")]
    #[validate(required, length(min = 1))]
    pub address: Option<String>,

    /// ISO date (`YYYY-MM-DD`)
    #[serde(default, alias = "fecha_contratacion")]
    #[schema(value_type = Option<String>, format = Date)]
    pub hire_date: Option<NaiveDate>,
}

/// Programmer profile request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ProgrammerProfileRequest {
    #[serde(alias = "usuario_id")]
    #[validate(required)]
    #[schema(value_type = Option<i64>)]
    pub user_id: Option<UserId>,

    #[serde(alias = "dni")]
    #[validate(required, length(min = 1))]
    pub national_id: Option<String>,

    #[serde(alias = "telefono")]
    #[validate(required, length(min = 1))]
    pub phone: Option<String>,

    #[serde(alias = "direccion")]
    #[validate(required, length(min = 1))]
    pub address: Option<String>,

    #[serde(default, alias = "fecha_contratacion")]
    #[schema(value_type = Option<String>, format = Date)]
    pub hire_date: Option<NaiveDate>,
}

/// Created profile
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileCreatedResponse {
    #[schema(value_type = i64)]
    pub id: ProfileId,
    #[schema(value_type = i64)]
    pub user_id: UserId,
    #[schema(value_type = String, example = "cliente")]
    pub role: Role,
    pub message: String,
}
