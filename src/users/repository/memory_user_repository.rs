use std::collections::HashMap;
use async_trait::async_trait;
use crate::core::library::{LibraryError, LibraryResult};
use crate::core::repository::Repository;
use crate::users::domain::model::{normalize_email, UserEntity};
use crate::users::repository::UserRepository;
use crate::utils::memory::{MemoryRecord, MemoryRepository, MemoryTables};

pub(crate) type MemoryUserRepository = MemoryRepository<UserEntity>;

impl MemoryRecord for UserEntity {
    const NAME: &'static str = "user";

    fn table(tables: &mut MemoryTables) -> &mut HashMap<String, Self> {
        &mut tables.users
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    fn sort_key(&self) -> String {
        format!("{}/{}", self.email, self.user_id)
    }

    fn check_unique(&self, table: &HashMap<String, Self>) -> LibraryResult<()> {
        if table.values().any(|u| u.email == self.email) {
            return Err(LibraryError::conflict(format!("email {} is already registered", self.email).as_str()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> LibraryResult<Option<UserEntity>> {
        let email = normalize_email(email);
        let tables = self.db.lock()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_external_id(&self, provider: &str, external_id: &str) -> LibraryResult<Option<UserEntity>> {
        let tables = self.db.lock()?;
        Ok(tables.users.values()
            .find(|u| u.external_provider.as_deref() == Some(provider) && u.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn save_refresh_token(&self, user_id: &str, token: Option<&str>) -> LibraryResult<()> {
        let mut tables = self.db.lock()?;
        let user = tables.users.get_mut(user_id)
            .ok_or_else(|| LibraryError::not_found(format!("user not found for {}", user_id).as_str()))?;
        user.refresh_token = token.map(str::to_string);
        user.version += 1;
        Ok(())
    }

    async fn swap_refresh_token(&self, user_id: &str, expected: &str, token: Option<&str>) -> LibraryResult<bool> {
        let mut tables = self.db.lock()?;
        match tables.users.get_mut(user_id) {
            Some(user) if user.refresh_token.as_deref() == Some(expected) => {
                user.refresh_token = token.map(str::to_string);
                user.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use crate::core::library::{LibraryError, Role};
    use crate::core::repository::Repository;
    use crate::users::domain::model::UserEntity;
    use crate::users::repository::UserRepository;
    use crate::users::repository::memory_user_repository::MemoryUserRepository;
    use crate::utils::memory::MemoryDatabase;

    fn new_user(email: &str) -> UserEntity {
        UserEntity::new("ana", email, "hash", Role::User, Utc::now().naive_utc())
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_email() {
        let users_repo = MemoryUserRepository::new(MemoryDatabase::new());
        users_repo.create(&new_user("ana@example.com")).await.expect("should create user");
        let res = users_repo.create(&new_user("ANA@example.com")).await;
        assert!(matches!(res, Err(LibraryError::Conflict { .. })));
        let found = users_repo.find_by_email("Ana@Example.com").await.expect("should query");
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_should_swap_refresh_token_once() {
        let users_repo = MemoryUserRepository::new(MemoryDatabase::new());
        let user = new_user("bob@example.com");
        users_repo.create(&user).await.expect("should create user");
        users_repo.save_refresh_token(user.user_id.as_str(), Some("r1")).await.expect("should save token");

        assert!(users_repo.swap_refresh_token(user.user_id.as_str(), "r1", Some("r2")).await.unwrap());
        assert!(!users_repo.swap_refresh_token(user.user_id.as_str(), "r1", Some("r3")).await.unwrap());
        let loaded = users_repo.get(user.user_id.as_str()).await.expect("should get user");
        assert_eq!(Some("r2".to_string()), loaded.refresh_token);
        assert_eq!(2, loaded.version);
    }

    #[tokio::test]
    async fn test_should_find_by_external_id() {
        let users_repo = MemoryUserRepository::new(MemoryDatabase::new());
        let mut user = new_user("carl@example.com");
        user.external_provider = Some("google".to_string());
        user.external_id = Some("g-123".to_string());
        users_repo.create(&user).await.expect("should create user");
        let found = users_repo.find_by_external_id("google", "g-123").await.expect("should query");
        assert_eq!(Some(user.user_id), found.map(|u| u.user_id));
        assert!(users_repo.find_by_external_id("github", "g-123").await.unwrap().is_none());
    }
}
