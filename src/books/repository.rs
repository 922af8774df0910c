pub mod ddb_book_repository;
pub mod memory_book_repository;

use async_trait::async_trait;
use crate::books::domain::model::BookEntity;
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;

#[async_trait]
pub(crate) trait BookRepository: Repository<BookEntity> {
    // the flag maintained by the loan transactions; NotFound for unknown books
    async fn is_available(&self, id: &str) -> LibraryResult<bool>;

    // deletes only while no loan holds the book; Conflict otherwise
    async fn delete_if_available(&self, id: &str) -> LibraryResult<usize>;
}
