pub mod service;
pub mod token;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::library::{LibraryResult, Role};
use crate::users::dto::UserDto;

#[async_trait]
pub(crate) trait AuthService: Sync + Send {
    async fn login(&self, email: &str, password: &str) -> LibraryResult<TokenPair>;
    async fn refresh(&self, refresh_token: &str) -> LibraryResult<TokenPair>;
    async fn authorize(&self, access_token: &str, required_roles: &[Role]) -> LibraryResult<Principal>;
    async fn logout(&self, refresh_token: &str) -> LibraryResult<()>;
    // sign-in through an identity provider that already verified the account
    async fn login_external(&self, provider: &str, external_id: &str,
                            email: &str, username: &str) -> LibraryResult<TokenPair>;
}

// Principal is the authenticated caller as asserted by a verified access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: &str, role: Role) -> Self {
        Self { user_id: user_id.to_string(), role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}

impl Default for Principal {
    fn default() -> Self {
        Principal::new("", Role::User)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    // access token lifetime in seconds
    pub expires_in: i64,
    pub user: UserDto,
}

#[cfg(test)]
mod tests {
    use crate::auth::domain::Principal;
    use crate::core::library::Role;

    #[tokio::test]
    async fn test_should_check_access() {
        let admin = Principal::new("a", Role::Admin);
        let user = Principal::new("u", Role::User);
        assert!(admin.can_access("u"));
        assert!(user.can_access("u"));
        assert!(!user.can_access("someone-else"));
        assert!(!Principal::default().is_admin());
    }
}
