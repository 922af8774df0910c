use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::AuthService;
use crate::core::command::{Command, CommandError};

pub(crate) struct LogoutCommand {
    auth_service: Box<dyn AuthService>,
}

impl LogoutCommand {
    pub(crate) fn new(auth_service: Box<dyn AuthService>) -> Self {
        Self {
            auth_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LogoutCommandRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LogoutCommandResponse {
    pub logged_out: bool,
}

impl LogoutCommandResponse {
    pub fn new() -> Self {
        Self {
            logged_out: true,
        }
    }
}

#[async_trait]
impl Command<LogoutCommandRequest, LogoutCommandResponse> for LogoutCommand {
    async fn execute(&self, req: LogoutCommandRequest) -> Result<LogoutCommandResponse, CommandError> {
        self.auth_service.logout(req.refresh_token.as_str())
            .await.map_err(CommandError::from).map(|_| LogoutCommandResponse::new())
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use lazy_static::lazy_static;
    use crate::auth::command::logout_cmd::{LogoutCommand, LogoutCommandRequest};
    use crate::auth::factory::create_auth_service;
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::repository::RepositoryStore;

    lazy_static! {
        static ref SUT : AsyncOnce<LogoutCommand> = AsyncOnce::new(async {
                let svc = create_auth_service(&Configuration::new("test"), RepositoryStore::Memory).await;
                LogoutCommand::new(svc)
            });
    }

    #[tokio::test]
    async fn test_should_reject_forged_logout() {
        let sut: &LogoutCommand = SUT.get().await;
        let res = sut.execute(LogoutCommandRequest { refresh_token: "forged".to_string() }).await;
        assert!(matches!(res, Err(CommandError::Unauthorized { .. })));
    }
}
