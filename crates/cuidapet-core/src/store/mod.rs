//! Account persistence
//!
//! [`AccountStore`] is the typed seam between the auth core and the
//! relational engine. Two implementations ship with the crate:
//! - [`PgStore`]: PostgreSQL via sqlx, using the legacy table layout
//! - [`MemoryStore`]: lock-guarded maps for tests and local development

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{DatabaseConfig, StoreBackend};
use crate::model::{NewUser, ProfileId, Role, RoleProfile, UserId, UserRecord, UserSummary};
use crate::Result;

/// Trait for account persistence
///
/// Every insert returns the generated identifier. Implementations must
/// reject a duplicate username and a second profile of the same kind for
/// one user with [`crate::StoreError::UniqueViolation`].
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a user and return its generated id
    async fn insert_user(&self, user: &NewUser) -> Result<UserId>;

    /// Get user by id
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>>;

    /// Get user by exact username
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Overwrite the stored digest. Updating a missing id is not an error.
    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> Result<()>;

    /// All users ordered by id ascending
    async fn list_users(&self) -> Result<Vec<UserSummary>>;

    /// Id of the `role` profile owned by `user_id`, if any
    async fn find_profile(&self, role: Role, user_id: UserId) -> Result<Option<ProfileId>>;

    /// Insert a role profile and return its generated id
    async fn insert_profile(&self, profile: &RoleProfile) -> Result<ProfileId>;

    /// Cheap connectivity check used by readiness probes
    async fn ping(&self) -> Result<()>;
}

/// Open the backend selected by configuration
///
/// The PostgreSQL backend also ensures the schema exists.
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn AccountStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory account store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let store = PgStore::new(&config.postgres_url, config.postgres_pool_size).await?;
            store.ensure_schema().await?;
            tracing::info!("Connected to PostgreSQL account store");
            Ok(Arc::new(store))
        }
    }
}
