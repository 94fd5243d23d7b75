//! Authentication and authorization module
//!
//! Components, leaf first:
//! - Password hashing with Argon2id, plus verification of werkzeug digests
//! - Session token issuance and verification (HS256 JWT)
//! - User directory over the account store
//! - Role profile registrar
//! - Authentication service (login, registration, password change)
//! - Access control middleware

pub mod directory;
pub mod jwt;
pub mod legacy;
pub mod middleware;
pub mod models;
pub mod password;
pub mod profiles;
pub mod service;

pub use directory::{DirectoryError, UserDirectory};
pub use jwt::{Claims, IssuedToken, JwtError, SessionUser, TokenService};
pub use middleware::{access_control, AccessError, AccessGuard, AccessPolicy, Stage};
pub use password::{CredentialHasher, PasswordError};
pub use profiles::{ProfileRegistrar, RegistrarError};
pub use service::{AuthService, AuthServiceError};
