//! OpenAPI document

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::auth::models::{
    ChangePasswordRequest, ClientProfileRequest, EmployeeProfileRequest, LoginRequest,
    LoginResponse, MessageResponse, ProfileCreatedResponse, ProgrammerProfileRequest,
    RegisterRequest, RegisterResponse, UserListResponse, UserResponse,
};
use crate::error::ApiError;
use crate::handlers::health::{HealthResponse, ReadinessResponse};
use crate::handlers::{auth, health, profiles, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CuidaPet accounts API",
        description = "Multi-role authentication and registration"
    ),
    paths(
        health::health_check,
        health::readiness_check,
        auth::login_handler,
        auth::register_handler,
        auth::change_password_handler,
        auth::me_handler,
        users::list_users,
        profiles::register_client,
        profiles::register_employee,
        profiles::register_programmer,
    ),
    components(schemas(
        ApiError,
        HealthResponse,
        ReadinessResponse,
        LoginRequest,
        LoginResponse,
        RegisterRequest,
        RegisterResponse,
        ChangePasswordRequest,
        MessageResponse,
        UserResponse,
        UserListResponse,
        ClientProfileRequest,
        EmployeeProfileRequest,
        ProgrammerProfileRequest,
        ProfileCreatedResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "auth", description = "Login, registration and passwords"),
        (name = "users", description = "User administration"),
        (name = "profiles", description = "Role-specific profiles"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_versioned_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/ready",
            "/api/v1/auth/login",
            "/api/v1/auth/register",
            "/api/v1/auth/password",
            "/api/v1/auth/me",
            "/api/v1/users",
            "/api/v1/profiles/client",
            "/api/v1/profiles/employee",
            "/api/v1/profiles/programmer",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
