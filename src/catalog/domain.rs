pub mod service;

use async_trait::async_trait;
use crate::books::dto::{BookChanges, BookDto, BookFilter};
use crate::core::library::{LibraryResult, PaginatedResult};

#[async_trait]
pub(crate) trait CatalogService: Sync + Send {
    // title and author are required; new books are always available
    async fn add_book(&self, book: &BookChanges) -> LibraryResult<BookDto>;
    async fn update_book(&self, id: &str, changes: &BookChanges) -> LibraryResult<BookDto>;
    async fn remove_book(&self, id: &str) -> LibraryResult<()>;
    async fn find_book_by_id(&self, id: &str) -> LibraryResult<BookDto>;
    async fn query_books(&self, filter: &BookFilter,
                         page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookDto>>;
    async fn check_availability(&self, id: &str) -> LibraryResult<bool>;
}
