use std::collections::HashMap;
use async_trait::async_trait;
use tracing::info;
use crate::books::domain::model::BookEntity;
use crate::books::dto::{BookChanges, BookDto, BookFilter};
use crate::books::repository::BookRepository;
use crate::catalog::domain::CatalogService;
use crate::core::clock::Clock;
use crate::core::domain::Configuration;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};

pub(crate) struct CatalogServiceImpl {
    book_repository: Box<dyn BookRepository>,
    clock: Box<dyn Clock>,
}

impl CatalogServiceImpl {
    pub(crate) fn new(_config: &Configuration, book_repository: Box<dyn BookRepository>,
                      clock: Box<dyn Clock>) -> Self {
        Self {
            book_repository,
            clock,
        }
    }
}

fn validate(book: &BookEntity) -> LibraryResult<()> {
    if book.title.trim().is_empty() || book.author.trim().is_empty() {
        return Err(LibraryError::validation("title and author are required", None));
    }
    if book.quantity < 0 {
        return Err(LibraryError::validation("quantity must not be negative", Some("quantity".to_string())));
    }
    Ok(())
}

#[async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn add_book(&self, book: &BookChanges) -> LibraryResult<BookDto> {
        let mut entity = BookEntity::new("", "", self.clock.now());
        book.apply(&mut entity);
        validate(&entity)?;
        self.book_repository.create(&entity).await?;
        info!(book_id = entity.book_id.as_str(), title = entity.title.as_str(), "added book");
        Ok(BookDto::from(&entity))
    }

    // Writes against the version read, so a loan taken meanwhile makes this a Conflict
    // instead of a stale write.
    async fn update_book(&self, id: &str, changes: &BookChanges) -> LibraryResult<BookDto> {
        let mut book = self.book_repository.get(id).await?;
        changes.apply(&mut book);
        validate(&book)?;
        book.updated_at = self.clock.now();
        self.book_repository.update(&book).await?;
        info!(book_id = id, "updated book");
        self.book_repository.get(id).await.map(|b| BookDto::from(&b))
    }

    async fn remove_book(&self, id: &str) -> LibraryResult<()> {
        let book = self.book_repository.get(id).await?;
        if !book.available {
            return Err(LibraryError::conflict("book is out on loan"));
        }
        self.book_repository.delete_if_available(id).await?;
        info!(book_id = id, "removed book");
        Ok(())
    }

    async fn find_book_by_id(&self, id: &str) -> LibraryResult<BookDto> {
        self.book_repository.get(id).await.map(|b| BookDto::from(&b))
    }

    async fn query_books(&self, filter: &BookFilter,
                         page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookDto>> {
        let mut predicate = HashMap::new();
        for (attr, value) in [("title", &filter.title), ("author", &filter.author), ("genre", &filter.genre)] {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                predicate.insert(format!("{}:contains", attr), value.to_string());
            }
        }
        if let Some(available) = filter.available {
            predicate.insert("available".to_string(), available.to_string());
        }
        let res = self.book_repository.query(&predicate, page, page_size).await?;
        let records = res.records.iter().map(BookDto::from).collect();
        Ok(PaginatedResult::new(page, page_size, res.next_page, records))
    }

    async fn check_availability(&self, id: &str) -> LibraryResult<bool> {
        self.book_repository.is_available(id).await
    }
}
