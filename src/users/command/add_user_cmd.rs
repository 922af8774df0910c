use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::Principal;
use crate::core::command::{Command, CommandError};
use crate::core::library::Role;
use crate::users::domain::UserService;
use crate::users::dto::UserDto;

pub(crate) struct AddUserCommand {
    user_service: Box<dyn UserService>,
}

impl AddUserCommand {
    pub(crate) fn new(user_service: Box<dyn UserService>) -> Self {
        Self {
            user_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddUserCommandRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(skip, default)]
    pub requester: Principal,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddUserCommandResponse {
    pub user: UserDto,
}

impl AddUserCommandResponse {
    pub fn new(user: UserDto) -> Self {
        Self {
            user,
        }
    }
}

#[async_trait]
impl Command<AddUserCommandRequest, AddUserCommandResponse> for AddUserCommand {
    async fn execute(&self, req: AddUserCommandRequest) -> Result<AddUserCommandResponse, CommandError> {
        if !req.requester.is_admin() {
            return Err(CommandError::forbidden("only admins may create accounts"));
        }
        self.user_service.register(req.username.as_str(), req.email.as_str(), req.password.as_str(), req.role)
            .await.map_err(CommandError::from).map(AddUserCommandResponse::new)
    }
}
