use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::Principal;
use crate::core::command::{Command, CommandError};
use crate::users::domain::UserService;

pub(crate) struct RemoveUserCommand {
    user_service: Box<dyn UserService>,
}

impl RemoveUserCommand {
    pub(crate) fn new(user_service: Box<dyn UserService>) -> Self {
        Self {
            user_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoveUserCommandRequest {
    pub user_id: String,
    #[serde(skip, default)]
    pub requester: Principal,
}

#[derive(Debug, Serialize)]
pub(crate) struct RemoveUserCommandResponse {}

impl RemoveUserCommandResponse {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Command<RemoveUserCommandRequest, RemoveUserCommandResponse> for RemoveUserCommand {
    async fn execute(&self, req: RemoveUserCommandRequest) -> Result<RemoveUserCommandResponse, CommandError> {
        self.user_service.remove_user(req.user_id.as_str(), &req.requester).await
            .map_err(CommandError::from).map(|_| RemoveUserCommandResponse::new())
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use lazy_static::lazy_static;
    use crate::auth::domain::Principal;
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::library::Role;
    use crate::core::repository::RepositoryStore;
    use crate::users::command::remove_user_cmd::{RemoveUserCommand, RemoveUserCommandRequest};
    use crate::users::factory::create_user_service;

    lazy_static! {
        static ref SUT : AsyncOnce<RemoveUserCommand> = AsyncOnce::new(async {
                let mut config = Configuration::new("test");
                config.bcrypt_cost = 4;
                let svc = create_user_service(&config, RepositoryStore::Memory).await;
                RemoveUserCommand::new(svc)
            });
    }

    #[tokio::test]
    async fn test_should_run_remove_user() {
        let mut config = Configuration::new("test");
        config.bcrypt_cost = 4;
        let svc = create_user_service(&config, RepositoryStore::Memory).await;
        let ana = svc.register("ana", "ana@remove-user.test", "secret-pw", None).await.expect("should register");
        let admin = Principal::new("root", Role::Admin);

        let sut: &RemoveUserCommand = SUT.get().await;
        sut.execute(RemoveUserCommandRequest { user_id: ana.user_id.to_string(), requester: admin.clone() })
            .await.expect("should remove user");
        let again = sut.execute(RemoveUserCommandRequest { user_id: ana.user_id.to_string(), requester: admin }).await;
        assert!(matches!(again, Err(CommandError::NotFound { .. })));
    }
}
