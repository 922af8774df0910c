use async_trait::async_trait;
use crate::core::library::LibraryError;

#[derive(Debug)]
pub enum CommandError {
    Unauthorized {
        message: String,
    },
    Forbidden {
        message: String,
        reason_code: Option<String>,
    },
    Conflict {
        message: String,
    },
    Database {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    NotFound {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    Serialization {
        message: String,
    },
    Validation {
        message: String,
        reason_code: Option<String>,
    },
}

impl CommandError {
    pub fn validation(message: &str) -> CommandError {
        CommandError::Validation { message: message.to_string(), reason_code: None }
    }

    pub fn unauthorized(message: &str) -> CommandError {
        CommandError::Unauthorized { message: message.to_string() }
    }

    pub fn forbidden(message: &str) -> CommandError {
        CommandError::Forbidden { message: message.to_string(), reason_code: None }
    }
}

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

// page size asked for by a listing request, bounded to 1..=100
pub(crate) fn page_size(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

#[async_trait]
pub trait Command<Request, Response> {
    async fn execute(&self, req: Request) -> Result<Response, CommandError>;
}

impl From<LibraryError> for CommandError {
    fn from(other: LibraryError) -> Self {
        match other {
            LibraryError::Database { message, reason_code, retryable } => {
                CommandError::Database { message, reason_code, retryable }
            }
            LibraryError::CurrentlyUnavailable { message, reason_code, retryable } => {
                CommandError::Runtime { message, reason_code, retryable }
            }
            LibraryError::Unauthorized { message } => {
                CommandError::Unauthorized { message }
            }
            LibraryError::Forbidden { message, reason_code } => {
                CommandError::Forbidden { message, reason_code }
            }
            LibraryError::Conflict { message } => {
                CommandError::Conflict { message }
            }
            LibraryError::NotFound { message } => {
                CommandError::NotFound { message }
            }
            LibraryError::Validation { message, reason_code } => {
                CommandError::Validation { message, reason_code }
            }
            LibraryError::Serialization { message } => {
                CommandError::Serialization { message }
            }
            LibraryError::Runtime { message, reason_code } => {
                CommandError::Runtime { message, reason_code, retryable: false }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::command::CommandError;
    use crate::core::library::LibraryError;

    #[tokio::test]
    async fn test_should_map_library_errors() {
        assert!(matches!(CommandError::from(LibraryError::conflict("taken")), CommandError::Conflict { .. }));
        assert!(matches!(CommandError::from(LibraryError::unauthorized("no")), CommandError::Unauthorized { .. }));
        assert!(matches!(CommandError::from(LibraryError::forbidden("no", None)), CommandError::Forbidden { .. }));
        assert!(matches!(CommandError::from(LibraryError::not_found("gone")), CommandError::NotFound { .. }));
        assert!(matches!(CommandError::from(LibraryError::unavailable("busy", None, true)),
            CommandError::Runtime { retryable: true, .. }));
    }

    #[tokio::test]
    async fn test_should_bound_page_size() {
        assert_eq!(20, super::page_size(None));
        assert_eq!(1, super::page_size(Some(0)));
        assert_eq!(100, super::page_size(Some(5000)));
    }
}
