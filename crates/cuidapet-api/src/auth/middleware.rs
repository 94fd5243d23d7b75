//! Access control for protected routes
//!
//! A route's requirements are an [`AccessPolicy`]: an ordered list of
//! [`Stage`]s evaluated front to back against the `Authorization` header.
//!
//! ```text
//! no token        -> 401
//! token present   -> verify -> failed -> 401
//!                           -> ok -> [role check] -> mismatch -> 403
//!                                                 -> ok -> handler
//! ```
//!
//! On success the verified [`SessionUser`] is added to request extensions
//! and handlers read it with `Extension<SessionUser>`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use cuidapet_core::Role;
use thiserror::Error;

use super::jwt::{JwtError, SessionUser, TokenService};
use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::error::AppError;

/// One step of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Require a valid session token
    Authenticate,
    /// Require the authenticated user to hold exactly this role
    RequireRole(Role),
}

/// Access control errors
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Authentication token is missing")]
    MissingToken,

    /// Verification detail stays in the audit log
    #[error("Invalid or expired token")]
    InvalidToken(#[source] JwtError),

    #[error("Requires role '{required}'")]
    InsufficientRole { required: Role, user: SessionUser },
}

/// Ordered access requirements for a group of routes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    stages: Vec<Stage>,
}

impl AccessPolicy {
    /// Policy that admits every request
    pub fn open() -> Self {
        Self::default()
    }

    /// Any valid session
    pub fn authenticated() -> Self {
        Self {
            stages: vec![Stage::Authenticate],
        }
    }

    /// Valid session whose role is `role`
    pub fn require_role(role: Role) -> Self {
        Self::authenticated().then(Stage::RequireRole(role))
    }

    /// Append a stage
    pub fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run every stage in order against the raw `Authorization` value
    ///
    /// Returns the verified session when the policy authenticates.
    /// A role stage reached without a session fails as a missing token.
    pub fn evaluate(
        &self,
        authorization: Option<&str>,
        tokens: &TokenService,
    ) -> Result<Option<SessionUser>, AccessError> {
        let mut session: Option<SessionUser> = None;

        for stage in &self.stages {
            match stage {
                Stage::Authenticate => {
                    let raw = authorization
                        .map(str::trim)
                        .filter(|value| !value.is_empty())
                        .ok_or(AccessError::MissingToken)?;

                    let user = tokens.verify(raw).map_err(AccessError::InvalidToken)?;
                    session = Some(user);
                }
                Stage::RequireRole(required) => {
                    let user = session.as_ref().ok_or(AccessError::MissingToken)?;
                    if user.role != *required {
                        return Err(AccessError::InsufficientRole {
                            required: *required,
                            user: user.clone(),
                        });
                    }
                }
            }
        }

        Ok(session)
    }
}

/// Middleware state: the policy to enforce and the key material to do it
#[derive(Clone)]
pub struct AccessGuard {
    policy: Arc<AccessPolicy>,
    tokens: Arc<TokenService>,
}

impl AccessGuard {
    pub fn new(policy: AccessPolicy, tokens: Arc<TokenService>) -> Self {
        Self {
            policy: Arc::new(policy),
            tokens,
        }
    }
}

/// Axum adapter for [`AccessPolicy`]
///
/// ```ignore
/// let guard = AccessGuard::new(AccessPolicy::require_role(Role::Programmer), tokens);
/// let app = Router::new()
///     .route("/users", get(list_users))
///     .route_layer(middleware::from_fn_with_state(guard, access_control));
/// ```
pub async fn access_control(
    State(guard): State<AccessGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match guard.policy.evaluate(authorization, &guard.tokens) {
        Ok(session) => {
            if let Some(user) = session {
                request.extensions_mut().insert(user);
            }
            Ok(next.run(request).await)
        }
        Err(err) => {
            let context = AuditContext::from_headers(request.headers());
            let resource = request.uri().path().to_string();

            match &err {
                AccessError::MissingToken => audit_log(&AuditEvent::InvalidToken {
                    resource,
                    reason: "missing".to_string(),
                    context,
                }),
                AccessError::InvalidToken(e) => audit_log(&AuditEvent::InvalidToken {
                    resource,
                    reason: e.reason().to_string(),
                    context,
                }),
                AccessError::InsufficientRole { required, user } => {
                    audit_log(&AuditEvent::AccessDenied {
                        user_id: user.id,
                        username: user.username.clone(),
                        resource,
                        required_role: *required,
                        context,
                    })
                }
            }

            Err(err.into())
        }
    }
}
