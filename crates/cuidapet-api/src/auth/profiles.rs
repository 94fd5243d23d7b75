//! Role profile registrar
//!
//! Every profile kind goes through the same checks before it is stored:
//! 1. the referenced user exists
//! 2. the user's role is the one the profile kind requires
//! 3. the user has no profile of this kind yet

use std::sync::Arc;

use cuidapet_core::{
    AccountStore, ClientProfile, EmployeeProfile, ProfileId, ProgrammerProfile, Role, RoleProfile,
    StoreError, UserId,
};
use thiserror::Error;

use super::directory::{DirectoryError, UserDirectory};

#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("Profile requires a user with role '{expected}', found '{actual}'")]
    RoleMismatch { expected: Role, actual: Role },

    #[error("User {user_id} already has a '{role}' profile")]
    ProfileAlreadyExists { role: Role, user_id: UserId },

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates role-specific extension records
#[derive(Clone)]
pub struct ProfileRegistrar {
    directory: UserDirectory,
    store: Arc<dyn AccountStore>,
}

impl ProfileRegistrar {
    pub fn new(directory: UserDirectory, store: Arc<dyn AccountStore>) -> Self {
        Self { directory, store }
    }

    pub async fn register_client(&self, profile: ClientProfile) -> Result<ProfileId, RegistrarError> {
        self.register(profile.into()).await
    }

    pub async fn register_employee(
        &self,
        profile: EmployeeProfile,
    ) -> Result<ProfileId, RegistrarError> {
        self.register(profile.into()).await
    }

    pub async fn register_programmer(
        &self,
        profile: ProgrammerProfile,
    ) -> Result<ProfileId, RegistrarError> {
        self.register(profile.into()).await
    }

    /// Validate and persist any profile kind
    pub async fn register(&self, profile: RoleProfile) -> Result<ProfileId, RegistrarError> {
        let user_id = profile.user_id();
        let expected = profile.role();

        let user = self
            .directory
            .find_by_id(user_id)
            .await?
            .ok_or(RegistrarError::UserNotFound(user_id))?;

        if user.role != expected {
            return Err(RegistrarError::RoleMismatch {
                expected,
                actual: user.role,
            });
        }

        let already_exists = RegistrarError::ProfileAlreadyExists {
            role: expected,
            user_id,
        };

        if self.store.find_profile(expected, user_id).await?.is_some() {
            return Err(already_exists);
        }

        match self.store.insert_profile(&profile).await {
            Ok(id) => {
                tracing::debug!(user_id = %user_id, role = %expected, profile_id = %id, "Profile created");
                Ok(id)
            }
            Err(StoreError::UniqueViolation(_)) => Err(already_exists),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::CredentialHasher;
    use crate::auth::test_support::StaleReadStore;
    use chrono::NaiveDate;
    use cuidapet_core::{MemoryStore, PasswordConfig};

    fn registrar() -> (ProfileRegistrar, UserDirectory, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let hasher = CredentialHasher::new(&PasswordConfig::fast()).unwrap();
        let directory = UserDirectory::new(store.clone(), hasher);
        let registrar = ProfileRegistrar::new(directory.clone(), store.clone());
        (registrar, directory, store)
    }

    fn client(user_id: UserId) -> ClientProfile {
        ClientProfile {
            user_id,
            address: "Calle 1".to_string(),
            phone: "555".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_client() {
        let (registrar, directory, store) = registrar();
        let id = directory.create("ana", "pw", "cliente").await.unwrap();

        registrar.register_client(client(id)).await.unwrap();
        let stored = store.profile(Role::Client, id).await.unwrap();
        assert_eq!(stored, RoleProfile::Client(client(id)));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (registrar, _, _) = registrar();
        let err = registrar.register_client(client(UserId(9))).await.unwrap_err();
        assert!(matches!(err, RegistrarError::UserNotFound(UserId(9))));
    }

    #[tokio::test]
    async fn test_client_profile_on_employee_is_role_mismatch() {
        let (registrar, directory, store) = registrar();
        let id = directory.create("eva", "pw", "empleado").await.unwrap();

        let err = registrar.register_client(client(id)).await.unwrap_err();
        assert!(matches!(
            err,
            RegistrarError::RoleMismatch {
                expected: Role::Client,
                actual: Role::Employee
            }
        ));
        assert!(store.profile(Role::Client, id).await.is_none());
    }

    #[tokio::test]
    async fn test_second_profile_rejected() {
        let (registrar, directory, _) = registrar();
        let id = directory.create("ana", "pw", "cliente").await.unwrap();

        registrar.register_client(client(id)).await.unwrap();
        let err = registrar.register_client(client(id)).await.unwrap_err();
        assert!(matches!(
            err,
            RegistrarError::ProfileAlreadyExists {
                role: Role::Client,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_concurrent_profile_registrations() {
        let (registrar, directory, _) = registrar();
        let id = directory.create("ana", "pw", "cliente").await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registrar = registrar.clone();
                tokio::spawn(async move { registrar.register_client(client(id)).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(RegistrarError::ProfileAlreadyExists { role, user_id }) => {
                    assert_eq!(role, Role::Client);
                    assert_eq!(user_id, id);
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_unique_violation_after_precheck_is_already_exists() {
        let (registrar, directory, store) = registrar();
        let id = directory.create("ana", "pw", "cliente").await.unwrap();
        registrar.register_client(client(id)).await.unwrap();

        // The profile pre-check misses, so the insert itself hits the constraint
        let racing = ProfileRegistrar::new(
            directory.clone(),
            Arc::new(StaleReadStore::new(store.clone())),
        );
        let err = racing.register_client(client(id)).await.unwrap_err();

        assert!(matches!(
            err,
            RegistrarError::ProfileAlreadyExists {
                role: Role::Client,
                user_id
            } if user_id == id
        ));
        assert_eq!(store.profile(Role::Client, id).await, Some(RoleProfile::Client(client(id))));
    }

    #[tokio::test]
    async fn test_employee_and_programmer_profiles() {
        let (registrar, directory, store) = registrar();
        let employee = directory.create("eva", "pw", "empleado").await.unwrap();
        let programmer = directory.create("pablo", "pw", "programador").await.unwrap();

        let hire_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        registrar
            .register_employee(EmployeeProfile {
                user_id: employee,
                specialty: "cirugia".to_string(),
                full_name: "Eva Ruiz".to_string(),
                national_id: "1".to_string(),
                phone: "2".to_string(),
                address: "3".to_string(),
                hire_date,
            })
            .await
            .unwrap();
        registrar
            .register_programmer(ProgrammerProfile {
                user_id: programmer,
                national_id: "4".to_string(),
                phone: "5".to_string(),
                address: "6".to_string(),
                hire_date: None,
            })
            .await
            .unwrap();

        match store.profile(Role::Employee, employee).await {
            Some(RoleProfile::Employee(p)) => assert_eq!(p.hire_date, hire_date),
            other => panic!("unexpected profile: {other:?}"),
        }
        match store.profile(Role::Programmer, programmer).await {
            Some(RoleProfile::Programmer(p)) => assert!(p.hire_date.is_none()),
            other => panic!("unexpected profile: {other:?}"),
        }
    }
}
