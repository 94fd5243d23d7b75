//! Role profile registration handlers

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use cuidapet_core::{
    ClientProfile, EmployeeProfile, ProgrammerProfile, RoleProfile, UserId,
};
use std::sync::Arc;

use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::auth::models::{
    ClientProfileRequest, EmployeeProfileRequest, ProfileCreatedResponse,
    ProgrammerProfileRequest,
};
use crate::auth::SessionUser;
use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::state::AppState;

/// Register, audit and build the 201 response shared by every profile kind
async fn create_profile(
    state: &AppState,
    caller: &SessionUser,
    headers: &HeaderMap,
    profile: RoleProfile,
) -> Result<(StatusCode, Json<ProfileCreatedResponse>), AppError> {
    let user_id = profile.user_id();
    let role = profile.role();
    let id = state.registrar.register(profile).await?;

    audit_log(&AuditEvent::ProfileCreated {
        profile_id: id,
        user_id,
        role,
        created_by: caller.id,
        context: AuditContext::from_headers(headers),
    });

    Ok((
        StatusCode::CREATED,
        Json(ProfileCreatedResponse {
            id,
            user_id,
            role,
            message: format!("Profile '{role}' registered successfully"),
        }),
    ))
}

fn required_user(user_id: Option<UserId>) -> Result<UserId, AppError> {
    user_id.ok_or_else(|| AppError::validation(vec!["user_id".to_string()]))
}

/// Register a client profile
///
/// `user_id` defaults to the authenticated caller.
#[utoipa::path(
    post,
    path = "/api/v1/profiles/client",
    tag = "profiles",
    request_body = ClientProfileRequest,
    responses(
        (status = 201, description = "Client profile created", body = ProfileCreatedResponse),
        (status = 400, description = "Missing fields or role mismatch", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
        (status = 409, description = "Profile already exists", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn register_client(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<SessionUser>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<ClientProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = ClientProfile {
        user_id: request.user_id.unwrap_or(caller.id),
        address: request.address.unwrap_or_default(),
        phone: request.phone.unwrap_or_default(),
    };

    create_profile(&state, &caller, &headers, profile.into()).await
}

/// Register an employee profile (programador only)
#[utoipa::path(
    post,
    path = "/api/v1/profiles/employee",
    tag = "profiles",
    request_body = EmployeeProfileRequest,
    responses(
        (status = 201, description = "Employee profile created", body = ProfileCreatedResponse),
        (status = 400, description = "Missing fields or role mismatch", body = crate::error::ApiError),
        (status = 403, description = "Requires role programador", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
        (status = 409, description = "Profile already exists", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn register_employee(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<SessionUser>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<EmployeeProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = EmployeeProfile {
        user_id: required_user(request.user_id)?,
        specialty: request.specialty.unwrap_or_default(),
        full_name: request.full_name.unwrap_or_default(),
        national_id: request.national_id.unwrap_or_default(),
        phone: request.phone.unwrap_or_default(),
        address: request.address.unwrap_or_default(),
        hire_date: request.hire_date,
    };

    create_profile(&state, &caller, &headers, profile.into()).await
}

/// Register a programmer profile (programador only)
#[utoipa::path(
    post,
    path = "/api/v1/profiles/programmer",
    tag = "profiles",
    request_body = ProgrammerProfileRequest,
    responses(
        (status = 201, description = "Programmer profile created", body = ProfileCreatedResponse),
        (status = 400, description = "Missing fields or role mismatch", body = crate::error::ApiError),
        (status = 403, description = "Requires role programador", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
        (status = 409, description = "Profile already exists", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn register_programmer(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<SessionUser>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<ProgrammerProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = ProgrammerProfile {
        user_id: required_user(request.user_id)?,
        national_id: request.national_id.unwrap_or_default(),
        phone: request.phone.unwrap_or_default(),
        address: request.address.unwrap_or_default(),
        hire_date: request.hire_date,
    };

    create_profile(&state, &caller, &headers, profile.into()).await
}
