use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::Principal;
use crate::core::command::{Command, CommandError};
use crate::users::domain::UserService;
use crate::users::dto::{UserChanges, UserDto};

pub(crate) struct UpdateUserCommand {
    user_service: Box<dyn UserService>,
}

impl UpdateUserCommand {
    pub(crate) fn new(user_service: Box<dyn UserService>) -> Self {
        Self {
            user_service,
        }
    }
}

// The body carries the changes; the id comes from the path.
#[derive(Debug, Deserialize)]
pub(crate) struct UpdateUserCommandRequest {
    #[serde(skip, default)]
    pub user_id: String,
    #[serde(flatten)]
    pub changes: UserChanges,
    #[serde(skip, default)]
    pub requester: Principal,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateUserCommandResponse {
    pub user: UserDto,
}

impl UpdateUserCommandResponse {
    pub fn new(user: UserDto) -> Self {
        Self {
            user,
        }
    }
}

#[async_trait]
impl Command<UpdateUserCommandRequest, UpdateUserCommandResponse> for UpdateUserCommand {
    async fn execute(&self, req: UpdateUserCommandRequest) -> Result<UpdateUserCommandResponse, CommandError> {
        self.user_service.update_user(req.user_id.as_str(), &req.changes, &req.requester)
            .await.map_err(CommandError::from).map(UpdateUserCommandResponse::new)
    }
}
