use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::{AuthService, TokenPair};
use crate::core::command::{Command, CommandError};

pub(crate) struct LoginCommand {
    auth_service: Box<dyn AuthService>,
}

impl LoginCommand {
    pub(crate) fn new(auth_service: Box<dyn AuthService>) -> Self {
        Self {
            auth_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginCommandRequest {
    email: String,
    password: String,
}

impl LoginCommandRequest {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginCommandResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
}

impl LoginCommandResponse {
    pub fn new(tokens: TokenPair) -> Self {
        Self {
            tokens,
        }
    }
}

#[async_trait]
impl Command<LoginCommandRequest, LoginCommandResponse> for LoginCommand {
    async fn execute(&self, req: LoginCommandRequest) -> Result<LoginCommandResponse, CommandError> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(CommandError::validation("email and password are required"));
        }
        self.auth_service.login(req.email.as_str(), req.password.as_str())
            .await.map_err(CommandError::from).map(LoginCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use lazy_static::lazy_static;
    use crate::auth::command::login_cmd::{LoginCommand, LoginCommandRequest};
    use crate::auth::factory::create_auth_service;
    use crate::core::clock::{Clock, SystemClock};
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::library::Role;
    use crate::core::repository::{Repository, RepositoryStore};
    use crate::users::domain::model::UserEntity;
    use crate::users::factory::create_user_repository;

    lazy_static! {
        static ref SUT : AsyncOnce<LoginCommand> = AsyncOnce::new(async {
                let mut config = Configuration::new("test");
                config.bcrypt_cost = 4;
                let svc = create_auth_service(&config, RepositoryStore::Memory).await;
                LoginCommand::new(svc)
            });
    }

    #[tokio::test]
    async fn test_should_run_login() {
        let hash = bcrypt::hash("secret-pw", 4).expect("should hash");
        let user = UserEntity::new("ana", "ana@login.test", hash.as_str(), Role::User, SystemClock.now());
        create_user_repository(RepositoryStore::Memory).await.create(&user).await.expect("should add user");

        let sut: &LoginCommand = SUT.get().await;
        let res = sut.execute(LoginCommandRequest::new("ana@login.test", "secret-pw")).await.expect("should login");
        assert_eq!(user.user_id, res.tokens.user.user_id);
        assert!(!res.tokens.refresh_token.is_empty());

        let res = sut.execute(LoginCommandRequest::new("ana@login.test", "wrong-pw")).await;
        assert!(matches!(res, Err(CommandError::Unauthorized { .. })));
        let res = sut.execute(LoginCommandRequest::new("", "")).await;
        assert!(matches!(res, Err(CommandError::Validation { .. })));
    }
}
