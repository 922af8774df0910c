pub mod ddb_user_repository;
pub mod memory_user_repository;

use async_trait::async_trait;
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;
use crate::users::domain::model::UserEntity;

#[async_trait]
pub(crate) trait UserRepository: Repository<UserEntity> {
    async fn find_by_email(&self, email: &str) -> LibraryResult<Option<UserEntity>>;

    async fn find_by_external_id(&self, provider: &str, external_id: &str) -> LibraryResult<Option<UserEntity>>;

    // overwrites the stored refresh token whatever it was
    async fn save_refresh_token(&self, user_id: &str, token: Option<&str>) -> LibraryResult<()>;

    // replaces the stored refresh token only while it still equals `expected`;
    // returns false when another writer got there first
    async fn swap_refresh_token(&self, user_id: &str, expected: &str, token: Option<&str>) -> LibraryResult<bool>;
}
