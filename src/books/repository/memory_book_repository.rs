use std::collections::HashMap;
use async_trait::async_trait;
use crate::books::domain::model::BookEntity;
use crate::books::repository::BookRepository;
use crate::core::library::{LibraryError, LibraryResult};
use crate::core::repository::Repository;
use crate::utils::memory::{MemoryRecord, MemoryRepository, MemoryTables};

pub(crate) type MemoryBookRepository = MemoryRepository<BookEntity>;

impl MemoryRecord for BookEntity {
    const NAME: &'static str = "book";

    fn table(tables: &mut MemoryTables) -> &mut HashMap<String, Self> {
        &mut tables.books
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    fn sort_key(&self) -> String {
        format!("{}/{}", self.title.to_lowercase(), self.book_id)
    }
}

#[async_trait]
impl BookRepository for MemoryBookRepository {
    async fn is_available(&self, id: &str) -> LibraryResult<bool> {
        self.get(id).await.map(|book| book.available)
    }

    async fn delete_if_available(&self, id: &str) -> LibraryResult<usize> {
        let mut tables = self.db.lock()?;
        match tables.books.get(id).map(|book| book.available) {
            None => Err(LibraryError::not_found(format!("book not found for {}", id).as_str())),
            Some(false) => Err(LibraryError::conflict("book is out on loan")),
            Some(true) => Ok(tables.books.remove(id).map(|_| 1).unwrap_or(0)),
        }
    }
}
