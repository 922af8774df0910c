use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::Principal;
use crate::books::dto::{BookChanges, BookDto};
use crate::catalog::domain::CatalogService;
use crate::core::command::{Command, CommandError};

pub(crate) struct AddBookCommand {
    catalog_service: Box<dyn CatalogService>,
}

impl AddBookCommand {
    pub(crate) fn new(catalog_service: Box<dyn CatalogService>) -> Self {
        Self {
            catalog_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddBookCommandRequest {
    #[serde(flatten)]
    pub book: BookChanges,
    #[serde(skip, default)]
    pub requester: Principal,
}

impl AddBookCommandRequest {
    pub fn new(title: &str, author: &str, requester: Principal) -> Self {
        Self {
            book: BookChanges {
                title: Some(title.to_string()),
                author: Some(author.to_string()),
                ..BookChanges::default()
            },
            requester,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AddBookCommandResponse {
    pub book: BookDto,
}

impl AddBookCommandResponse {
    pub fn new(book: BookDto) -> Self {
        Self {
            book,
        }
    }
}

#[async_trait]
impl Command<AddBookCommandRequest, AddBookCommandResponse> for AddBookCommand {
    async fn execute(&self, req: AddBookCommandRequest) -> Result<AddBookCommandResponse, CommandError> {
        if !req.requester.is_admin() {
            return Err(CommandError::forbidden("only admins may add books"));
        }
        self.catalog_service.add_book(&req.book).await.map_err(CommandError::from).map(AddBookCommandResponse::new)
    }
}
