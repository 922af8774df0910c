use std::collections::HashMap;
use std::sync::Mutex;
use async_trait::async_trait;
use lazy_static::lazy_static;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{info, warn};
use crate::auth::domain::{AuthService, Principal, TokenPair};
use crate::auth::domain::token::{TokenKind, TokenSigner};
use crate::core::clock::Clock;
use crate::core::domain::Configuration;
use crate::core::library::{LibraryError, LibraryResult, Role};
use crate::users::domain::model::UserEntity;
use crate::users::dto::UserDto;
use crate::users::repository::UserRepository;

const INVALID_CREDENTIALS: &str = "invalid credentials";

lazy_static! {
    // one throwaway hash per cost so a login for an unknown e-mail pays for a bcrypt verify
    static ref DUMMY_HASHES: Mutex<HashMap<u32, String>> = Mutex::new(HashMap::new());
}

fn dummy_hash(cost: u32) -> String {
    let mut hashes = match DUMMY_HASHES.lock() {
        Ok(hashes) => hashes,
        Err(poisoned) => poisoned.into_inner(),
    };
    hashes.entry(cost)
        .or_insert_with(|| bcrypt::hash("library-api-dummy-password", cost).unwrap_or_default())
        .clone()
}

pub(crate) struct AuthServiceImpl {
    user_repository: Box<dyn UserRepository>,
    signer: TokenSigner,
    clock: Box<dyn Clock>,
    bcrypt_cost: u32,
}

impl AuthServiceImpl {
    pub(crate) fn new(config: &Configuration, user_repository: Box<dyn UserRepository>,
                      clock: Box<dyn Clock>) -> Self {
        Self {
            user_repository,
            signer: TokenSigner::new(config),
            clock,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    fn issue_pair(&self, user: &UserEntity) -> LibraryResult<TokenPair> {
        let now = self.clock.now();
        Ok(TokenPair {
            access_token: self.signer.issue(user.user_id.as_str(), user.role, TokenKind::Access, now)?,
            refresh_token: self.signer.issue(user.user_id.as_str(), user.role, TokenKind::Refresh, now)?,
            token_type: "Bearer".to_string(),
            expires_in: self.signer.access_ttl_secs(),
            user: UserDto::from(user),
        })
    }

    // a login always replaces whatever session the account had
    async fn start_session(&self, user: &UserEntity) -> LibraryResult<TokenPair> {
        let pair = self.issue_pair(user)?;
        self.user_repository.save_refresh_token(user.user_id.as_str(), Some(pair.refresh_token.as_str())).await?;
        info!(user_id = user.user_id.as_str(), "session started");
        Ok(pair)
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn login(&self, email: &str, password: &str) -> LibraryResult<TokenPair> {
        let user = self.user_repository.find_by_email(email).await?;
        let Some(user) = user else {
            let _ = bcrypt::verify(password, dummy_hash(self.bcrypt_cost).as_str());
            warn!("login rejected for unknown account");
            return Err(LibraryError::unauthorized(INVALID_CREDENTIALS));
        };
        if !bcrypt::verify(password, user.password_hash.as_str()).unwrap_or(false) {
            warn!(user_id = user.user_id.as_str(), "login rejected for wrong password");
            return Err(LibraryError::unauthorized(INVALID_CREDENTIALS));
        }
        self.start_session(&user).await
    }

    async fn refresh(&self, refresh_token: &str) -> LibraryResult<TokenPair> {
        let claims = self.signer.verify(refresh_token, TokenKind::Refresh, self.clock.now())?;
        let user = match self.user_repository.get(claims.sub.as_str()).await {
            Ok(user) => user,
            Err(LibraryError::NotFound { .. }) => {
                return Err(LibraryError::unauthorized("unknown account"));
            }
            Err(err) => {
                return Err(err);
            }
        };
        if user.refresh_token.as_deref() != Some(refresh_token) {
            warn!(user_id = user.user_id.as_str(), "superseded refresh token presented");
            return Err(LibraryError::unauthorized("refresh token is no longer valid"));
        }
        let pair = self.issue_pair(&user)?;
        let swapped = self.user_repository.swap_refresh_token(
            user.user_id.as_str(), refresh_token, Some(pair.refresh_token.as_str())).await?;
        if !swapped {
            warn!(user_id = user.user_id.as_str(), "refresh token rotated concurrently");
            return Err(LibraryError::unauthorized("refresh token is no longer valid"));
        }
        Ok(pair)
    }

    async fn authorize(&self, access_token: &str, required_roles: &[Role]) -> LibraryResult<Principal> {
        let claims = self.signer.verify(access_token, TokenKind::Access, self.clock.now())?;
        if !required_roles.is_empty() && !required_roles.contains(&claims.role) {
            return Err(LibraryError::forbidden("insufficient permissions", Some(claims.role.to_string())));
        }
        Ok(Principal::new(claims.sub.as_str(), claims.role))
    }

    async fn logout(&self, refresh_token: &str) -> LibraryResult<()> {
        let claims = self.signer.verify(refresh_token, TokenKind::Refresh, self.clock.now())?;
        let cleared = self.user_repository.swap_refresh_token(claims.sub.as_str(), refresh_token, None).await?;
        if cleared {
            info!(user_id = claims.sub.as_str(), "session ended");
        }
        Ok(())
    }

    async fn login_external(&self, provider: &str, external_id: &str,
                            email: &str, username: &str) -> LibraryResult<TokenPair> {
        if provider.trim().is_empty() || external_id.trim().is_empty() || email.trim().is_empty() {
            return Err(LibraryError::validation("provider, external id and email are required", None));
        }
        if let Some(user) = self.user_repository.find_by_external_id(provider, external_id).await? {
            return self.start_session(&user).await;
        }
        let now = self.clock.now();
        let user = match self.user_repository.find_by_email(email).await? {
            Some(mut user) => {
                user.external_provider = Some(provider.to_string());
                user.external_id = Some(external_id.to_string());
                user.updated_at = now;
                self.user_repository.update(&user).await?;
                info!(user_id = user.user_id.as_str(), provider, "linked external identity");
                user
            }
            None => {
                // the account can only be reached through the provider until a password is set
                let secret: String = rand::thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect();
                let hash = bcrypt::hash(secret, self.bcrypt_cost)?;
                let name = if username.trim().is_empty() { email } else { username };
                let mut user = UserEntity::new(name, email, hash.as_str(), Role::User, now);
                user.external_provider = Some(provider.to_string());
                user.external_id = Some(external_id.to_string());
                self.user_repository.create(&user).await?;
                info!(user_id = user.user_id.as_str(), provider, "created account for external identity");
                user
            }
        };
        self.start_session(&user).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use crate::auth::domain::AuthService;
    use crate::auth::domain::service::AuthServiceImpl;
    use crate::core::clock::testing::FixedClock;
    use crate::core::domain::Configuration;
    use crate::core::library::{LibraryError, Role};
    use crate::core::repository::Repository;
    use crate::users::domain::model::UserEntity;
    use crate::users::repository::memory_user_repository::MemoryUserRepository;
    use crate::utils::memory::MemoryDatabase;

    fn config() -> Configuration {
        let mut config = Configuration::new("test");
        config.bcrypt_cost = 4;
        config
    }

    async fn setup(role: Role) -> (AuthServiceImpl, FixedClock, UserEntity) {
        let db = MemoryDatabase::new();
        let clock = FixedClock::new();
        let hash = bcrypt::hash("secret-pw", 4).unwrap();
        let user = UserEntity::new("ana", "ana@example.com", hash.as_str(), role, Utc::now().naive_utc());
        MemoryUserRepository::new(db.clone()).create(&user).await.unwrap();
        let svc = AuthServiceImpl::new(&config(), Box::new(MemoryUserRepository::new(db)), Box::new(clock.clone()));
        (svc, clock, user)
    }

    #[tokio::test]
    async fn test_should_login_and_authorize() {
        let (svc, _, user) = setup(Role::User).await;
        let pair = svc.login("ANA@example.com", "secret-pw").await.expect("should login");
        assert_eq!("Bearer", pair.token_type.as_str());
        assert_eq!(user.user_id, pair.user.user_id);
        let principal = svc.authorize(pair.access_token.as_str(), &[]).await.expect("should authorize");
        assert_eq!(user.user_id, principal.user_id);
        assert_eq!(Role::User, principal.role);
    }

    #[tokio::test]
    async fn test_should_reject_bad_credentials_alike() {
        let (svc, _, _) = setup(Role::User).await;
        let wrong_password = svc.login("ana@example.com", "nope").await.unwrap_err();
        let unknown_user = svc.login("who@example.com", "secret-pw").await.unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(unknown_user, LibraryError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_should_distinguish_unauthorized_from_forbidden() {
        let (svc, clock, _) = setup(Role::User).await;
        let pair = svc.login("ana@example.com", "secret-pw").await.unwrap();
        assert!(matches!(svc.authorize(pair.access_token.as_str(), &[Role::Admin]).await,
            Err(LibraryError::Forbidden { .. })));
        assert!(matches!(svc.authorize(pair.refresh_token.as_str(), &[]).await,
            Err(LibraryError::Unauthorized { .. })));
        clock.advance(Duration::hours(2));
        assert!(matches!(svc.authorize(pair.access_token.as_str(), &[Role::User]).await,
            Err(LibraryError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_should_rotate_refresh_token_once() {
        let (svc, _, _) = setup(Role::Admin).await;
        let first = svc.login("ana@example.com", "secret-pw").await.unwrap();
        let second = svc.refresh(first.refresh_token.as_str()).await.expect("should refresh");
        assert_ne!(first.refresh_token, second.refresh_token);
        // reuse of the rotated token is rejected, the fresh one still works
        assert!(matches!(svc.refresh(first.refresh_token.as_str()).await, Err(LibraryError::Unauthorized { .. })));
        let third = svc.refresh(second.refresh_token.as_str()).await.expect("should refresh again");
        assert_eq!(Role::Admin, third.user.role);
    }

    #[tokio::test]
    async fn test_should_let_only_one_concurrent_refresh_win() {
        let (svc, _, _) = setup(Role::User).await;
        let pair = svc.login("ana@example.com", "secret-pw").await.unwrap();
        let (a, b) = tokio::join!(svc.refresh(pair.refresh_token.as_str()), svc.refresh(pair.refresh_token.as_str()));
        assert_eq!(1, [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count());
    }

    #[tokio::test]
    async fn test_should_expire_refresh_tokens() {
        let (svc, clock, _) = setup(Role::User).await;
        let pair = svc.login("ana@example.com", "secret-pw").await.unwrap();
        clock.advance(Duration::days(8));
        assert!(matches!(svc.refresh(pair.refresh_token.as_str()).await, Err(LibraryError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_should_invalidate_on_new_login_and_logout() {
        let (svc, _, _) = setup(Role::User).await;
        let first = svc.login("ana@example.com", "secret-pw").await.unwrap();
        let second = svc.login("ana@example.com", "secret-pw").await.unwrap();
        assert!(svc.refresh(first.refresh_token.as_str()).await.is_err());

        svc.logout(second.refresh_token.as_str()).await.expect("should logout");
        assert!(svc.refresh(second.refresh_token.as_str()).await.is_err());
        // logging out twice is harmless
        svc.logout(second.refresh_token.as_str()).await.expect("should ignore stale logout");
    }

    #[tokio::test]
    async fn test_should_login_external_identities() {
        let (svc, _, user) = setup(Role::User).await;
        // links the existing account by e-mail
        let linked = svc.login_external("google", "g-1", "ana@example.com", "Ana").await.expect("should link");
        assert_eq!(user.user_id, linked.user.user_id);
        assert_eq!(Some("google".to_string()), linked.user.external_provider);
        // then finds it by the external id
        let again = svc.login_external("google", "g-1", "changed@example.com", "Ana").await.expect("should login");
        assert_eq!(user.user_id, again.user.user_id);
        // unknown identities get a fresh user account
        let created = svc.login_external("google", "g-2", "new@example.com", "").await.expect("should create");
        assert_ne!(user.user_id, created.user.user_id);
        assert_eq!(Role::User, created.user.role);
        assert_eq!("new@example.com", created.user.username.as_str());
    }
}
