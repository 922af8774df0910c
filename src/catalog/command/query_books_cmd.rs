use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::books::dto::{BookDto, BookFilter};
use crate::catalog::domain::CatalogService;
use crate::core::command::{Command, CommandError, page_size};
use crate::core::library::PaginatedResult;

pub(crate) struct QueryBooksCommand {
    catalog_service: Box<dyn CatalogService>,
}

impl QueryBooksCommand {
    pub(crate) fn new(catalog_service: Box<dyn CatalogService>) -> Self {
        Self {
            catalog_service,
        }
    }
}

// Built from the query string, e.g. `?author=herbert&available=true`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryBooksCommandRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub available: Option<bool>,
    pub page: Option<String>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryBooksCommandResponse {
    pub books: PaginatedResult<BookDto>,
}

impl QueryBooksCommandResponse {
    pub fn new(books: PaginatedResult<BookDto>) -> Self {
        Self {
            books,
        }
    }
}

#[async_trait]
impl Command<QueryBooksCommandRequest, QueryBooksCommandResponse> for QueryBooksCommand {
    async fn execute(&self, req: QueryBooksCommandRequest) -> Result<QueryBooksCommandResponse, CommandError> {
        let filter = BookFilter {
            title: req.title,
            author: req.author,
            genre: req.genre,
            available: req.available,
        };
        self.catalog_service.query_books(&filter, req.page.as_deref(), page_size(req.page_size))
            .await.map_err(CommandError::from).map(QueryBooksCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use lazy_static::lazy_static;
    use crate::auth::domain::Principal;
    use crate::catalog::command::add_book_cmd::{AddBookCommand, AddBookCommandRequest};
    use crate::catalog::command::query_books_cmd::{QueryBooksCommand, QueryBooksCommandRequest};
    use crate::catalog::factory;
    use crate::core::command::Command;
    use crate::core::domain::Configuration;
    use crate::core::library::Role;
    use crate::core::repository::RepositoryStore;

    lazy_static! {
        static ref ADD_CMD : AsyncOnce<AddBookCommand> = AsyncOnce::new(async {
                let svc = factory::create_catalog_service(&Configuration::new("test"), RepositoryStore::Memory).await;
                AddBookCommand::new(svc)
            });
        static ref SUT : AsyncOnce<QueryBooksCommand> = AsyncOnce::new(async {
                let svc = factory::create_catalog_service(&Configuration::new("test"), RepositoryStore::Memory).await;
                QueryBooksCommand::new(svc)
            });
    }

    #[tokio::test]
    async fn test_should_run_query_books() {
        let admin = Principal::new("root", Role::Admin);
        ADD_CMD.get().await
            .execute(AddBookCommandRequest::new("Zettelkasten Querying", "Query Tester", admin))
            .await.expect("should add book");
        let req = QueryBooksCommandRequest { author: Some("query tester".to_string()), ..QueryBooksCommandRequest::default() };
        let res = SUT.get().await.execute(req).await.expect("should query books");
        assert_eq!(1, res.books.records.len());
        assert_eq!("Zettelkasten Querying", res.books.records[0].title.as_str());
    }
}
