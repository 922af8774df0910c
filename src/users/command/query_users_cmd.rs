use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::Principal;
use crate::core::command::{Command, CommandError, page_size};
use crate::core::library::PaginatedResult;
use crate::users::domain::UserService;
use crate::users::dto::UserDto;

pub(crate) struct QueryUsersCommand {
    user_service: Box<dyn UserService>,
}

impl QueryUsersCommand {
    pub(crate) fn new(user_service: Box<dyn UserService>) -> Self {
        Self {
            user_service,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryUsersCommandRequest {
    pub page: Option<String>,
    pub page_size: Option<usize>,
    #[serde(skip, default)]
    pub requester: Principal,
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryUsersCommandResponse {
    pub users: PaginatedResult<UserDto>,
}

impl QueryUsersCommandResponse {
    pub fn new(users: PaginatedResult<UserDto>) -> Self {
        Self {
            users,
        }
    }
}

#[async_trait]
impl Command<QueryUsersCommandRequest, QueryUsersCommandResponse> for QueryUsersCommand {
    async fn execute(&self, req: QueryUsersCommandRequest) -> Result<QueryUsersCommandResponse, CommandError> {
        self.user_service.query_users(&req.requester, req.page.as_deref(), page_size(req.page_size))
            .await.map_err(CommandError::from).map(QueryUsersCommandResponse::new)
    }
}
