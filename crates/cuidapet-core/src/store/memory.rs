//! In-memory account store
//!
//! All state sits behind one `RwLock` so uniqueness checks and inserts are
//! atomic with respect to each other.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::AccountStore;
use crate::model::{NewUser, ProfileId, Role, RoleProfile, UserId, UserRecord, UserSummary};
use crate::{Result, StoreError};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, UserRecord>,
    profiles: BTreeMap<(Role, UserId), (ProfileId, RoleProfile)>,
    next_user_id: i64,
    next_profile_id: BTreeMap<Role, i64>,
}

/// Account store kept entirely in process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored profile for `(role, user_id)`, used by tests and tooling
    pub async fn profile(&self, role: Role, user_id: UserId) -> Option<RoleProfile> {
        let tables = self.tables.read().await;
        tables
            .profiles
            .get(&(role, user_id))
            .map(|(_, profile)| profile.clone())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_user(&self, user: &NewUser) -> Result<UserId> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation("usuario_nombre_key".to_string()));
        }

        tables.next_user_id += 1;
        let id = UserId(tables.next_user_id);
        tables.users.insert(
            id,
            UserRecord {
                id,
                username: user.username.clone(),
                password_hash: user.password_hash.clone(),
                role: user.role,
            },
        );

        Ok(id)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.get_mut(&id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().map(UserRecord::summary).collect())
    }

    async fn find_profile(&self, role: Role, user_id: UserId) -> Result<Option<ProfileId>> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.get(&(role, user_id)).map(|(id, _)| *id))
    }

    async fn insert_profile(&self, profile: &RoleProfile) -> Result<ProfileId> {
        let mut tables = self.tables.write().await;
        let key = (profile.role(), profile.user_id());

        if !tables.users.contains_key(&key.1) {
            return Err(StoreError::Database(format!(
                "foreign key violation: user {} does not exist",
                key.1
            )));
        }
        if tables.profiles.contains_key(&key) {
            return Err(StoreError::UniqueViolation(format!(
                "{}_usuario_idusuario_key",
                key.0
            )));
        }

        let counter = tables.next_profile_id.entry(key.0).or_insert(0);
        *counter += 1;
        let id = ProfileId(*counter);
        tables.profiles.insert(key, (id, profile.clone()));

        Ok(id)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClientProfile, ProgrammerProfile};
    use std::sync::Arc;

    fn new_user(name: &str, role: Role) -> NewUser {
        NewUser {
            username: name.to_string(),
            password_hash: format!("hash-of-{name}"),
            role,
        }
    }

    fn client_profile(user_id: UserId) -> RoleProfile {
        ClientProfile {
            user_id,
            address: "Calle 1".to_string(),
            phone: "555-0101".to_string(),
        }
        .into()
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let store = MemoryStore::new();
        let id = store.insert_user(&new_user("ana", Role::Client)).await.unwrap();

        let by_id = store.find_user_by_id(id).await.unwrap().unwrap();
        let by_name = store.find_user_by_username("ana").await.unwrap().unwrap();
        assert_eq!(by_id, by_name);
        assert_eq!(by_id.role, Role::Client);

        assert!(store.find_user_by_username("ANA").await.unwrap().is_none());
        assert!(store.find_user_by_id(UserId(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_unique_violation() {
        let store = MemoryStore::new();
        store.insert_user(&new_user("ana", Role::Client)).await.unwrap();

        let err = store
            .insert_user(&new_user("ana", Role::Employee))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_concurrent_inserts_admit_one_winner() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.insert_user(&new_user("race", Role::Client)).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_users_ordered_by_id() {
        let store = MemoryStore::new();
        for name in ["carla", "ana", "bruno"] {
            store.insert_user(&new_user(name, Role::Client)).await.unwrap();
        }

        let names: Vec<_> = store
            .list_users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["carla", "ana", "bruno"]);
    }

    #[tokio::test]
    async fn test_update_password_hash() {
        let store = MemoryStore::new();
        let id = store.insert_user(&new_user("ana", Role::Client)).await.unwrap();

        store.update_password_hash(id, "new-hash").await.unwrap();
        let user = store.find_user_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.password_hash, "new-hash");

        // Missing ids are ignored
        store.update_password_hash(UserId(42), "x").await.unwrap();
    }

    #[tokio::test]
    async fn test_profiles_unique_per_kind_and_user() {
        let store = MemoryStore::new();
        let id = store.insert_user(&new_user("ana", Role::Client)).await.unwrap();

        let profile_id = store.insert_profile(&client_profile(id)).await.unwrap();
        assert_eq!(
            store.find_profile(Role::Client, id).await.unwrap(),
            Some(profile_id)
        );
        assert!(store.find_profile(Role::Employee, id).await.unwrap().is_none());

        let err = store.insert_profile(&client_profile(id)).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_profile_requires_existing_user() {
        let store = MemoryStore::new();
        let profile = RoleProfile::from(ProgrammerProfile {
            user_id: UserId(5),
            national_id: "X".to_string(),
            phone: "1".to_string(),
            address: "A".to_string(),
            hire_date: None,
        });

        let err = store.insert_profile(&profile).await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
