//! CuidaPet Core - Domain models, configuration and persistence
//!
//! This crate defines the core abstractions shared by the API server and the CLI:
//! - User identity and role-specific profile models
//! - Configuration management
//! - Common error types
//! - The `AccountStore` persistence trait with PostgreSQL and in-memory backends

pub mod config;
pub mod model;
pub mod store;

pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, PasswordConfig,
    ServerConfig, StoreBackend,
};
pub use model::{
    ClientProfile, EmployeeProfile, NewUser, ProfileId, ProgrammerProfile, Role, RoleParseError,
    RoleProfile, UserId, UserRecord, UserSummary,
};
pub use store::{open_store, AccountStore, MemoryStore, PgStore};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors reported by the persistence layer
///
/// `UniqueViolation` is the authoritative duplicate guard: the application
/// checks for duplicates first, but concurrent requests can still race past
/// that check and only the store sees the conflict.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::UniqueViolation(
                    db_err
                        .constraint()
                        .map(str::to_string)
                        .unwrap_or_else(|| db_err.message().to_string()),
                )
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
