pub mod model;
pub mod service;

use async_trait::async_trait;
use crate::auth::domain::Principal;
use crate::core::library::{LibraryResult, PaginatedResult, Role};
use crate::users::dto::{UserChanges, UserDto};

#[async_trait]
pub(crate) trait UserService: Sync + Send {
    // role defaults to user
    async fn register(&self, username: &str, email: &str, password: &str, role: Option<Role>) -> LibraryResult<UserDto>;
    async fn find_user_by_id(&self, id: &str, requester: &Principal) -> LibraryResult<UserDto>;
    async fn query_users(&self, requester: &Principal, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<UserDto>>;
    async fn update_user(&self, id: &str, changes: &UserChanges, requester: &Principal) -> LibraryResult<UserDto>;
    async fn remove_user(&self, id: &str, requester: &Principal) -> LibraryResult<()>;
}
