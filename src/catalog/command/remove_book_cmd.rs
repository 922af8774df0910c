use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::Principal;
use crate::catalog::domain::CatalogService;
use crate::core::command::{Command, CommandError};

pub(crate) struct RemoveBookCommand {
    catalog_service: Box<dyn CatalogService>,
}

impl RemoveBookCommand {
    pub(crate) fn new(catalog_service: Box<dyn CatalogService>) -> Self {
        Self {
            catalog_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoveBookCommandRequest {
    pub book_id: String,
    #[serde(skip, default)]
    pub requester: Principal,
}

#[derive(Debug, Serialize)]
pub(crate) struct RemoveBookCommandResponse {}

impl RemoveBookCommandResponse {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Command<RemoveBookCommandRequest, RemoveBookCommandResponse> for RemoveBookCommand {
    async fn execute(&self, req: RemoveBookCommandRequest) -> Result<RemoveBookCommandResponse, CommandError> {
        if !req.requester.is_admin() {
            return Err(CommandError::forbidden("only admins may remove books"));
        }
        self.catalog_service.remove_book(req.book_id.as_str()).await
            .map_err(CommandError::from).map(|_| RemoveBookCommandResponse::new())
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use lazy_static::lazy_static;
    use crate::auth::domain::Principal;
    use crate::catalog::command::add_book_cmd::{AddBookCommand, AddBookCommandRequest};
    use crate::catalog::command::remove_book_cmd::{RemoveBookCommand, RemoveBookCommandRequest};
    use crate::catalog::factory;
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::library::Role;
    use crate::core::repository::RepositoryStore;

    lazy_static! {
        static ref ADD_CMD : AsyncOnce<AddBookCommand> = AsyncOnce::new(async {
                let svc = factory::create_catalog_service(&Configuration::new("test"), RepositoryStore::Memory).await;
                AddBookCommand::new(svc)
            });
        static ref SUT : AsyncOnce<RemoveBookCommand> = AsyncOnce::new(async {
                let svc = factory::create_catalog_service(&Configuration::new("test"), RepositoryStore::Memory).await;
                RemoveBookCommand::new(svc)
            });
    }

    #[tokio::test]
    async fn test_should_run_remove_book() {
        let admin = Principal::new("root", Role::Admin);
        let added = ADD_CMD.get().await
            .execute(AddBookCommandRequest::new("Beloved", "Toni Morrison", admin.clone()))
            .await.expect("should add book");
        let sut: &RemoveBookCommand = SUT.get().await;

        let req = RemoveBookCommandRequest { book_id: added.book.book_id.to_string(), requester: Principal::new("u1", Role::User) };
        assert!(matches!(sut.execute(req).await, Err(CommandError::Forbidden { .. })));

        let req = RemoveBookCommandRequest { book_id: added.book.book_id.to_string(), requester: admin };
        let _ = sut.execute(req).await.expect("should remove book");
    }
}
