use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::users::domain::UserService;
use crate::users::dto::UserDto;

pub(crate) struct RegisterUserCommand {
    user_service: Box<dyn UserService>,
}

impl RegisterUserCommand {
    pub(crate) fn new(user_service: Box<dyn UserService>) -> Self {
        Self {
            user_service,
        }
    }
}

// Self-registration always creates a `user` account; a role in the body is ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct RegisterUserCommandRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterUserCommandRequest {
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterUserCommandResponse {
    pub user: UserDto,
}

impl RegisterUserCommandResponse {
    pub fn new(user: UserDto) -> Self {
        Self {
            user,
        }
    }
}

#[async_trait]
impl Command<RegisterUserCommandRequest, RegisterUserCommandResponse> for RegisterUserCommand {
    async fn execute(&self, req: RegisterUserCommandRequest) -> Result<RegisterUserCommandResponse, CommandError> {
        self.user_service.register(req.username.as_str(), req.email.as_str(), req.password.as_str(), None)
            .await.map_err(CommandError::from).map(RegisterUserCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use lazy_static::lazy_static;
    use serde_json::json;
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::library::Role;
    use crate::core::repository::RepositoryStore;
    use crate::users::command::register_user_cmd::{RegisterUserCommand, RegisterUserCommandRequest};
    use crate::users::factory::create_user_service;

    lazy_static! {
        static ref SUT : AsyncOnce<RegisterUserCommand> = AsyncOnce::new(async {
                let mut config = Configuration::new("test");
                config.bcrypt_cost = 4;
                let svc = create_user_service(&config, RepositoryStore::Memory).await;
                RegisterUserCommand::new(svc)
            });
    }

    #[tokio::test]
    async fn test_should_run_register_user() {
        let sut: &RegisterUserCommand = SUT.get().await;
        let body = json!({"username": "ana", "email": "ana@register.test", "password": "secret-pw", "role": "admin"});
        let req: RegisterUserCommandRequest = serde_json::from_value(body).expect("should parse request");
        let res = sut.execute(req).await.expect("should register");
        assert_eq!(Role::User, res.user.role);

        let dup = sut.execute(RegisterUserCommandRequest::new("ana2", "ana@register.test", "secret-pw")).await;
        assert!(matches!(dup, Err(CommandError::Conflict { .. })));
    }
}
