use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::catalog::domain::CatalogService;
use crate::core::command::{Command, CommandError};

pub(crate) struct BookAvailabilityCommand {
    catalog_service: Box<dyn CatalogService>,
}

impl BookAvailabilityCommand {
    pub(crate) fn new(catalog_service: Box<dyn CatalogService>) -> Self {
        Self {
            catalog_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BookAvailabilityCommandRequest {
    pub book_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct BookAvailabilityCommandResponse {
    pub book_id: String,
    pub available: bool,
}

#[async_trait]
impl Command<BookAvailabilityCommandRequest, BookAvailabilityCommandResponse> for BookAvailabilityCommand {
    async fn execute(&self, req: BookAvailabilityCommandRequest) -> Result<BookAvailabilityCommandResponse, CommandError> {
        let available = self.catalog_service.check_availability(req.book_id.as_str())
            .await.map_err(CommandError::from)?;
        Ok(BookAvailabilityCommandResponse { book_id: req.book_id, available })
    }
}
