use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::error;
use crate::core::command::CommandError;
use crate::core::domain::Configuration;
use crate::core::repository::RepositoryStore;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppState {
    pub(crate) config: Configuration,
    pub(crate) store: RepositoryStore,
}

impl AppState {
    pub fn new(config: Configuration, store: RepositoryStore) -> AppState {
        AppState {
            config,
            store,
        }
    }
}

pub(crate) type ServerError = (StatusCode, String);

pub(crate) fn json_to_server_error(err: serde_json::Error) -> ServerError {
    (StatusCode::BAD_REQUEST, format!("{}", err))
}

impl From<CommandError> for ServerError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Unauthorized { .. } => {
                (StatusCode::UNAUTHORIZED, format!("{:?}", err))
            }
            CommandError::Forbidden { .. } => {
                (StatusCode::FORBIDDEN, format!("{:?}", err))
            }
            CommandError::Conflict { .. } => {
                (StatusCode::CONFLICT, format!("{:?}", err))
            }
            CommandError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, format!("{:?}", err))
            }
            CommandError::Serialization { .. } => {
                (StatusCode::BAD_REQUEST, format!("{:?}", err))
            }
            CommandError::Validation { .. } => {
                (StatusCode::BAD_REQUEST, format!("{:?}", err))
            }
            CommandError::Database { .. } | CommandError::Runtime { .. } => {
                error!(error = ?err, "unexpected failure while handling request");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        }
    }
}
