use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::{AuthService, TokenPair};
use crate::core::command::{Command, CommandError};

pub(crate) struct RefreshCommand {
    auth_service: Box<dyn AuthService>,
}

impl RefreshCommand {
    pub(crate) fn new(auth_service: Box<dyn AuthService>) -> Self {
        Self {
            auth_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshCommandRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshCommandResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
}

impl RefreshCommandResponse {
    pub fn new(tokens: TokenPair) -> Self {
        Self {
            tokens,
        }
    }
}

#[async_trait]
impl Command<RefreshCommandRequest, RefreshCommandResponse> for RefreshCommand {
    async fn execute(&self, req: RefreshCommandRequest) -> Result<RefreshCommandResponse, CommandError> {
        self.auth_service.refresh(req.refresh_token.as_str())
            .await.map_err(CommandError::from).map(RefreshCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use lazy_static::lazy_static;
    use crate::auth::command::login_cmd::{LoginCommand, LoginCommandRequest};
    use crate::auth::command::refresh_cmd::{RefreshCommand, RefreshCommandRequest};
    use crate::auth::factory::create_auth_service;
    use crate::core::clock::{Clock, SystemClock};
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::library::Role;
    use crate::core::repository::{Repository, RepositoryStore};
    use crate::users::domain::model::UserEntity;
    use crate::users::factory::create_user_repository;

    lazy_static! {
        static ref LOGIN_CMD : AsyncOnce<LoginCommand> = AsyncOnce::new(async {
                let svc = create_auth_service(&Configuration::new("test"), RepositoryStore::Memory).await;
                LoginCommand::new(svc)
            });
        static ref SUT : AsyncOnce<RefreshCommand> = AsyncOnce::new(async {
                let svc = create_auth_service(&Configuration::new("test"), RepositoryStore::Memory).await;
                RefreshCommand::new(svc)
            });
    }

    #[tokio::test]
    async fn test_should_run_refresh_once() {
        let hash = bcrypt::hash("secret-pw", 4).expect("should hash");
        let user = UserEntity::new("bob", "bob@refresh.test", hash.as_str(), Role::User, SystemClock.now());
        create_user_repository(RepositoryStore::Memory).await.create(&user).await.expect("should add user");
        let login = LOGIN_CMD.get().await.execute(LoginCommandRequest::new("bob@refresh.test", "secret-pw"))
            .await.expect("should login");

        let sut: &RefreshCommand = SUT.get().await;
        let old = login.tokens.refresh_token;
        let res = sut.execute(RefreshCommandRequest { refresh_token: old.to_string() }).await.expect("should refresh");
        assert_ne!(old, res.tokens.refresh_token);
        let reuse = sut.execute(RefreshCommandRequest { refresh_token: old }).await;
        assert!(matches!(reuse, Err(CommandError::Unauthorized { .. })));
    }
}
