//! Application state management

use cuidapet_core::{AccountStore, AppConfig};
use std::sync::Arc;
use std::time::Instant;

use crate::auth::{AuthService, CredentialHasher, PasswordError, ProfileRegistrar, TokenService, UserDirectory};

/// Application state shared across handlers
///
/// Built once at startup and never mutated afterwards.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Account persistence
    pub store: Arc<dyn AccountStore>,
    /// Session token keys
    pub tokens: Arc<TokenService>,
    /// Login, registration and password change
    pub auth: AuthService,
    /// Role profile creation
    pub registrar: ProfileRegistrar,
}

impl AppState {
    /// Wire the auth components over `store`
    pub fn new(config: AppConfig, store: Arc<dyn AccountStore>) -> Result<Self, PasswordError> {
        let hasher = CredentialHasher::new(&config.auth.password)?;
        let tokens = Arc::new(TokenService::new(&config.auth));
        let directory = UserDirectory::new(store.clone(), hasher);

        Ok(Self {
            auth: AuthService::new(directory.clone(), tokens.clone()),
            registrar: ProfileRegistrar::new(directory, store.clone()),
            config,
            start_time: Instant::now(),
            store,
            tokens,
        })
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if the store answers
    pub async fn is_ready(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Account store is not reachable");
                false
            }
        }
    }
}
