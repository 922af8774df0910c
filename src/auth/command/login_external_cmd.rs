use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::{AuthService, TokenPair};
use crate::core::command::{Command, CommandError};

// Sign-in on behalf of an identity gateway that has already verified the account
// with its provider. Only callers holding the configured gateway key get through.
pub(crate) struct LoginExternalCommand {
    auth_service: Box<dyn AuthService>,
    gateway_key: Option<String>,
}

impl LoginExternalCommand {
    pub(crate) fn new(auth_service: Box<dyn AuthService>, gateway_key: Option<String>) -> Self {
        Self {
            auth_service,
            gateway_key,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginExternalCommandRequest {
    provider: String,
    external_id: String,
    email: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(skip, default)]
    pub gateway_key: Option<String>,
}

impl LoginExternalCommandRequest {
    pub fn new(provider: &str, external_id: &str, email: &str, gateway_key: Option<&str>) -> Self {
        Self {
            provider: provider.to_string(),
            external_id: external_id.to_string(),
            email: email.to_string(),
            username: None,
            gateway_key: gateway_key.map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginExternalCommandResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
}

impl LoginExternalCommandResponse {
    pub fn new(tokens: TokenPair) -> Self {
        Self {
            tokens,
        }
    }
}

// compares every byte so the time taken does not reveal the matching prefix
fn same_key(expected: &str, given: &str) -> bool {
    expected.len() == given.len() &&
        expected.bytes().zip(given.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

#[async_trait]
impl Command<LoginExternalCommandRequest, LoginExternalCommandResponse> for LoginExternalCommand {
    async fn execute(&self, req: LoginExternalCommandRequest) -> Result<LoginExternalCommandResponse, CommandError> {
        let expected = self.gateway_key.as_deref()
            .ok_or_else(|| CommandError::forbidden("external sign-in is disabled"))?;
        match req.gateway_key.as_deref() {
            Some(given) if same_key(expected, given) => {}
            _ => return Err(CommandError::unauthorized("invalid gateway key")),
        }
        let username = req.username.as_deref().unwrap_or_default();
        self.auth_service.login_external(req.provider.as_str(), req.external_id.as_str(), req.email.as_str(), username)
            .await.map_err(CommandError::from).map(LoginExternalCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use lazy_static::lazy_static;
    use crate::auth::command::login_external_cmd::{LoginExternalCommand, LoginExternalCommandRequest};
    use crate::auth::factory::create_auth_service;
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::library::Role;
    use crate::core::repository::RepositoryStore;

    const GATEWAY_KEY: &str = "gateway-key-for-tests";

    lazy_static! {
        static ref SUT : AsyncOnce<LoginExternalCommand> = AsyncOnce::new(async {
                let mut config = Configuration::new("test");
                config.bcrypt_cost = 4;
                config.external_auth_key = Some(GATEWAY_KEY.to_string());
                let svc = create_auth_service(&config, RepositoryStore::Memory).await;
                LoginExternalCommand::new(svc, config.external_auth_key.clone())
            });
    }

    #[tokio::test]
    async fn test_should_run_login_external() {
        let sut: &LoginExternalCommand = SUT.get().await;
        let req = LoginExternalCommandRequest::new("google", "g-1001", "ana@login-external.test", Some(GATEWAY_KEY));
        let first = sut.execute(req).await.expect("should sign in");
        assert_eq!(Role::User, first.tokens.user.role);
        assert!(!first.tokens.access_token.is_empty());

        let req = LoginExternalCommandRequest::new("google", "g-1001", "ana@login-external.test", Some(GATEWAY_KEY));
        let again = sut.execute(req).await.expect("should sign in again");
        assert_eq!(first.tokens.user.user_id, again.tokens.user.user_id);
    }

    #[tokio::test]
    async fn test_should_reject_callers_without_gateway_key() {
        let sut: &LoginExternalCommand = SUT.get().await;
        let req = LoginExternalCommandRequest::new("google", "g-2002", "bob@login-external.test", None);
        assert!(matches!(sut.execute(req).await, Err(CommandError::Unauthorized { .. })));
        let req = LoginExternalCommandRequest::new("google", "g-2002", "bob@login-external.test", Some("gateway-key-for-test"));
        assert!(matches!(sut.execute(req).await, Err(CommandError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_should_refuse_when_not_configured() {
        let svc = create_auth_service(&Configuration::new("test"), RepositoryStore::Memory).await;
        let sut = LoginExternalCommand::new(svc, None);
        let req = LoginExternalCommandRequest::new("google", "g-3003", "eve@login-external.test", Some(GATEWAY_KEY));
        assert!(matches!(sut.execute(req).await, Err(CommandError::Forbidden { .. })));
    }
}
