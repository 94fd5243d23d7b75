//! Security audit logging for authentication events
//!
//! Every event is logged at INFO level with the `"audit"` target so it can
//! be filtered and routed separately from application logs, e.g.
//! `RUST_LOG=audit=info`. Each event also bumps the
//! `cuidapet_auth_events_total` counter.
//!
//! ```ignore
//! use cuidapet_api::audit::{audit_log, AuditContext, AuditEvent};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: user.id,
//!     username: user.username.clone(),
//!     role: user.role,
//!     context: AuditContext::from_headers(&headers),
//! });
//! ```

use axum::http::HeaderMap;
use chrono::Utc;
use cuidapet_core::{ProfileId, Role, UserId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::middleware::metrics::record_auth_event;

/// Client metadata attached to every audit event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    /// Client IP address (from proxy headers)
    pub ip_address: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
}

impl AuditContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Security audit events for authentication and authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    LoginSuccess {
        user_id: UserId,
        username: String,
        role: Role,
        #[serde(flatten)]
        context: AuditContext,
    },

    /// The reason is for operators only; clients always see the same message
    LoginFailure {
        username: String,
        reason: String,
        #[serde(flatten)]
        context: AuditContext,
    },

    RegistrationSuccess {
        user_id: UserId,
        username: String,
        role: Role,
        #[serde(flatten)]
        context: AuditContext,
    },

    RegistrationFailure {
        username: String,
        reason: String,
        #[serde(flatten)]
        context: AuditContext,
    },

    PasswordChange {
        user_id: UserId,
        username: String,
        #[serde(flatten)]
        context: AuditContext,
    },

    PasswordChangeFailure {
        user_id: UserId,
        username: String,
        reason: String,
        #[serde(flatten)]
        context: AuditContext,
    },

    ProfileCreated {
        profile_id: ProfileId,
        user_id: UserId,
        role: Role,
        created_by: UserId,
        #[serde(flatten)]
        context: AuditContext,
    },

    /// Authenticated caller lacks the required role
    AccessDenied {
        user_id: UserId,
        username: String,
        resource: String,
        required_role: Role,
        #[serde(flatten)]
        context: AuditContext,
    },

    /// Missing, malformed, expired or forged token
    InvalidToken {
        resource: String,
        reason: String,
        #[serde(flatten)]
        context: AuditContext,
    },
}

impl AuditEvent {
    /// Stable event name, also used as the metrics label
    pub fn name(&self) -> &'static str {
        match self {
            AuditEvent::LoginSuccess { .. } => "login_success",
            AuditEvent::LoginFailure { .. } => "login_failure",
            AuditEvent::RegistrationSuccess { .. } => "registration_success",
            AuditEvent::RegistrationFailure { .. } => "registration_failure",
            AuditEvent::PasswordChange { .. } => "password_change",
            AuditEvent::PasswordChangeFailure { .. } => "password_change_failure",
            AuditEvent::ProfileCreated { .. } => "profile_created",
            AuditEvent::AccessDenied { .. } => "access_denied",
            AuditEvent::InvalidToken { .. } => "invalid_token",
        }
    }
}

/// Log a security audit event with structured fields
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    record_auth_event(event.name());

    match event {
        AuditEvent::LoginSuccess {
            user_id,
            username,
            role,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                role = %role,
                ip_address = ?context.ip_address,
                "Login successful"
            );
        }
        AuditEvent::LoginFailure {
            username,
            reason,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                ip_address = ?context.ip_address,
                "Login failed"
            );
        }
        AuditEvent::RegistrationSuccess {
            user_id,
            username,
            role,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                role = %role,
                ip_address = ?context.ip_address,
                "Registration successful"
            );
        }
        AuditEvent::RegistrationFailure {
            username,
            reason,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                ip_address = ?context.ip_address,
                "Registration failed"
            );
        }
        AuditEvent::PasswordChange {
            user_id,
            username,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                ip_address = ?context.ip_address,
                "Password changed"
            );
        }
        AuditEvent::PasswordChangeFailure {
            user_id,
            username,
            reason,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                reason = %reason,
                ip_address = ?context.ip_address,
                "Password change failed"
            );
        }
        AuditEvent::ProfileCreated {
            profile_id,
            user_id,
            role,
            created_by,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                profile_id = %profile_id,
                user_id = %user_id,
                role = %role,
                created_by = %created_by,
                ip_address = ?context.ip_address,
                "Profile created"
            );
        }
        AuditEvent::AccessDenied {
            user_id,
            username,
            resource,
            required_role,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                resource = %resource,
                required_role = %required_role,
                ip_address = ?context.ip_address,
                "Access denied"
            );
        }
        AuditEvent::InvalidToken {
            resource,
            reason,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                resource = %resource,
                reason = %reason,
                ip_address = ?context.ip_address,
                "Invalid token"
            );
        }
    }
}

/// Extract IP address from request headers
///
/// Checks X-Forwarded-For, then X-Real-IP. The socket address is not
/// available at this layer.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    // Check X-Forwarded-For (proxy/load balancer)
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            // Take the first IP in the chain (client IP)
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    // Check X-Real-IP (nginx proxy)
    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

/// Extract user agent from request headers
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
