use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::Principal;
use crate::books::dto::{BookChanges, BookDto};
use crate::catalog::domain::CatalogService;
use crate::core::command::{Command, CommandError};

pub(crate) struct UpdateBookCommand {
    catalog_service: Box<dyn CatalogService>,
}

impl UpdateBookCommand {
    pub(crate) fn new(catalog_service: Box<dyn CatalogService>) -> Self {
        Self {
            catalog_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateBookCommandRequest {
    #[serde(skip, default)]
    pub book_id: String,
    #[serde(flatten)]
    pub changes: BookChanges,
    #[serde(skip, default)]
    pub requester: Principal,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateBookCommandResponse {
    pub book: BookDto,
}

impl UpdateBookCommandResponse {
    pub fn new(book: BookDto) -> Self {
        Self {
            book,
        }
    }
}

#[async_trait]
impl Command<UpdateBookCommandRequest, UpdateBookCommandResponse> for UpdateBookCommand {
    async fn execute(&self, req: UpdateBookCommandRequest) -> Result<UpdateBookCommandResponse, CommandError> {
        if !req.requester.is_admin() {
            return Err(CommandError::forbidden("only admins may update books"));
        }
        self.catalog_service.update_book(req.book_id.as_str(), &req.changes)
            .await.map_err(CommandError::from).map(UpdateBookCommandResponse::new)
    }
}
