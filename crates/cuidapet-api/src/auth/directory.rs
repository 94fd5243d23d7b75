//! User directory
//!
//! CRUD over the base identity entity. Plaintext passwords enter here and
//! leave as Argon2 digests; nothing above this layer touches a digest.

use std::sync::Arc;

use cuidapet_core::{AccountStore, NewUser, Role, StoreError, UserId, UserRecord, UserSummary};
use thiserror::Error;

use super::password::{CredentialHasher, PasswordError};

/// User directory errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Invalid role '{0}'. Must be one of: programador, empleado, cliente")]
    InvalidRole(String),

    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Identity lookups and mutations backed by an [`AccountStore`]
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn AccountStore>,
    hasher: CredentialHasher,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn AccountStore>, hasher: CredentialHasher) -> Self {
        Self { store, hasher }
    }

    pub async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.store.find_user_by_id(id).await?)
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.store.find_user_by_username(username).await?)
    }

    /// Create a user with a hashed credential
    ///
    /// `role` must be one of the wire tokens, compared case-insensitively.
    /// The username pre-check gives a friendly error; a unique violation
    /// from the store covers the race between two concurrent registrations.
    pub async fn create(
        &self,
        username: &str,
        plaintext: &str,
        role: &str,
    ) -> Result<UserId, DirectoryError> {
        let role: Role = role
            .to_lowercase()
            .parse()
            .map_err(|_| DirectoryError::InvalidRole(role.to_string()))?;

        if self.store.find_user_by_username(username).await?.is_some() {
            return Err(DirectoryError::DuplicateUsername(username.to_string()));
        }

        let password_hash = self.hasher.hash_blocking(plaintext).await?;
        let new_user = NewUser {
            username: username.to_string(),
            password_hash,
            role,
        };

        match self.store.insert_user(&new_user).await {
            Ok(id) => {
                tracing::debug!(user_id = %id, role = %role, "User created");
                Ok(id)
            }
            Err(StoreError::UniqueViolation(_)) => {
                Err(DirectoryError::DuplicateUsername(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Re-hash and overwrite the stored credential
    pub async fn update_password(&self, id: UserId, plaintext: &str) -> Result<(), DirectoryError> {
        let password_hash = self.hasher.hash_blocking(plaintext).await?;
        self.store.update_password_hash(id, &password_hash).await?;
        Ok(())
    }

    /// All users by ascending id, without credentials
    pub async fn list_all(&self) -> Result<Vec<UserSummary>, DirectoryError> {
        Ok(self.store.list_users().await?)
    }

    /// False when the user does not exist or the password does not match
    pub async fn verify_password(&self, id: UserId, plaintext: &str) -> Result<bool, DirectoryError> {
        match self.store.find_user_by_id(id).await? {
            Some(user) => Ok(self.check_credential(&user, plaintext).await),
            None => Ok(false),
        }
    }

    /// Compare `plaintext` against an already loaded record
    pub async fn check_credential(&self, user: &UserRecord, plaintext: &str) -> bool {
        self.hasher
            .verify_blocking(&user.password_hash, plaintext)
            .await
    }

    /// True when the stored credential predates Argon2id
    pub fn needs_upgrade(&self, user: &UserRecord) -> bool {
        self.hasher.needs_upgrade(&user.password_hash)
    }
}
