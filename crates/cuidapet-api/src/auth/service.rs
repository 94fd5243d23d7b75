//! Authentication service layer
//!
//! Login, registration and password change on top of the user directory
//! and the token service.

use std::sync::Arc;

use cuidapet_core::{UserId, UserSummary};
use thiserror::Error;

use super::directory::{DirectoryError, UserDirectory};
use super::jwt::{JwtError, SessionUser, TokenService};
use super::models::{LoginResponse, RegisterResponse};

#[derive(Debug, Error)]
pub enum AuthServiceError {
    /// Unknown user and wrong password are deliberately indistinguishable
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    WrongCurrentPassword,

    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    directory: UserDirectory,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(directory: UserDirectory, tokens: Arc<TokenService>) -> Self {
        Self { directory, tokens }
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Exchange credentials for a session token
    ///
    /// A matching werkzeug digest is replaced with Argon2id on the way out.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, AuthServiceError> {
        let user = self
            .directory
            .find_by_username(username)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !self.directory.check_credential(&user, password).await {
            return Err(AuthServiceError::InvalidCredentials);
        }

        if self.directory.needs_upgrade(&user) {
            match self.directory.update_password(user.id, password).await {
                Ok(()) => tracing::info!(user_id = %user.id, "Upgraded legacy password digest"),
                Err(e) => {
                    tracing::warn!(user_id = %user.id, error = %e, "Failed to upgrade legacy password digest")
                }
            }
        }

        let issued = self.tokens.issue(&SessionUser::from(&user))?;

        Ok(LoginResponse {
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            user: user.summary().into(),
        })
    }

    /// Create a user; the role-specific profile is a separate step
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<RegisterResponse, AuthServiceError> {
        let id = self.directory.create(username, password, role).await?;

        Ok(RegisterResponse {
            id,
            message: "User registered successfully".to_string(),
            next_step: format!(
                "Complete the role-specific registration for role: {}",
                role.to_lowercase()
            ),
        })
    }

    /// Replace the caller's password after checking the current one
    ///
    /// Nothing is written when the current password does not match.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthServiceError> {
        if !self
            .directory
            .verify_password(user_id, current_password)
            .await?
        {
            return Err(AuthServiceError::WrongCurrentPassword);
        }

        self.directory.update_password(user_id, new_password).await?;
        Ok(())
    }

    /// Fresh view of the authenticated user
    pub async fn current_user(&self, user_id: UserId) -> Result<UserSummary, AuthServiceError> {
        self.directory
            .find_by_id(user_id)
            .await?
            .map(|user| user.summary())
            .ok_or(AuthServiceError::UserNotFound(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::CredentialHasher;
    use cuidapet_core::{AccountStore, AuthConfig, MemoryStore, NewUser, PasswordConfig, Role};

    fn service_over(store: Arc<MemoryStore>) -> (AuthService, Arc<TokenService>) {
        let hasher = CredentialHasher::new(&PasswordConfig::fast()).unwrap();
        let directory = UserDirectory::new(store, hasher);
        let tokens = Arc::new(TokenService::new(&AuthConfig::default()));
        (AuthService::new(directory, tokens.clone()), tokens)
    }

    fn service() -> (AuthService, Arc<TokenService>) {
        service_over(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (service, tokens) = service();

        let registered = service.register("ana", "pw123", "cliente").await.unwrap();
        assert!(registered.next_step.contains("cliente"));

        let login = service.login("ana", "pw123").await.unwrap();
        assert_eq!(login.token_type, "Bearer");
        assert_eq!(login.user.id, registered.id);

        let session = tokens.verify(&login.token).unwrap();
        assert_eq!(session.id, registered.id);
        assert_eq!(session.username, "ana");
        assert_eq!(session.role, Role::Client);
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let (service, _) = service();
        service.register("ana", "pw123", "cliente").await.unwrap();

        let wrong_password = service.login("ana", "nope").await.unwrap_err();
        let unknown_user = service.login("nadie", "pw123").await.unwrap_err();

        assert!(matches!(wrong_password, AuthServiceError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthServiceError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_login_upgrades_werkzeug_digest() {
        let store = Arc::new(MemoryStore::new());
        let id = store
            .insert_user(&NewUser {
                username: "vieja".to_string(),
                password_hash: "pbkdf2:sha256:1000$76cbnSgrUGs4B4M6$024101c6dab4e252ba0c42271ffa404db7daf44f7e26d4a6849ca0b4763027fd".to_string(),
                role: Role::Client,
            })
            .await
            .unwrap();
        let (service, _) = service_over(store.clone());

        assert!(matches!(
            service.login("vieja", "wrong").await,
            Err(AuthServiceError::InvalidCredentials)
        ));
        let unchanged = store.find_user_by_id(id).await.unwrap().unwrap();
        assert!(unchanged.password_hash.starts_with("pbkdf2:sha256:"));

        let login = service.login("vieja", "pw123").await.unwrap();
        assert_eq!(login.user.id, id);

        let upgraded = store.find_user_by_id(id).await.unwrap().unwrap();
        assert!(upgraded.password_hash.starts_with("$argon2id$"));
        assert!(service.login("vieja", "pw123").await.is_ok());
    }

    #[tokio::test]
    async fn test_register_role_any_case() {
        let (service, tokens) = service();
        let registered = service.register("ana", "pw123", "Cliente").await.unwrap();
        assert!(registered.next_step.ends_with("role: cliente"));

        let login = service.login("ana", "pw123").await.unwrap();
        assert_eq!(tokens.verify(&login.token).unwrap().role, Role::Client);
    }

    #[tokio::test]
    async fn test_register_invalid_role() {
        let (service, _) = service();
        let err = service.register("ana", "pw123", "admin").await.unwrap_err();
        assert!(matches!(
            err,
            AuthServiceError::Directory(DirectoryError::InvalidRole(_))
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let (service, _) = service();
        let id = service.register("ana", "old", "cliente").await.unwrap().id;

        service.change_password(id, "old", "new").await.unwrap();
        assert!(service.login("ana", "old").await.is_err());
        assert!(service.login("ana", "new").await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_current_password_changes_nothing() {
        let (service, _) = service();
        let id = service.register("ana", "old", "cliente").await.unwrap().id;

        let err = service.change_password(id, "wrong", "new").await.unwrap_err();
        assert!(matches!(err, AuthServiceError::WrongCurrentPassword));
        assert!(service.login("ana", "old").await.is_ok());
        assert!(service.login("ana", "new").await.is_err());
    }

    #[tokio::test]
    async fn test_current_user() {
        let (service, _) = service();
        let id = service.register("eva", "pw", "empleado").await.unwrap().id;

        let me = service.current_user(id).await.unwrap();
        assert_eq!(me.username, "eva");
        assert!(matches!(
            service.current_user(UserId(999)).await,
            Err(AuthServiceError::UserNotFound(_))
        ));
    }
}
