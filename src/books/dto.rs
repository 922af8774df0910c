use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::books::domain::model::BookEntity;
use crate::core::domain::Identifiable;
use crate::utils::date::serializer;

// BookDto is a data transfer object for Catalog service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct BookDto {
    pub book_id: String,
    pub version: i64,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub quantity: i64,
    pub available: bool,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl Identifiable for BookDto {
    fn id(&self) -> String {
        self.book_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl From<&BookEntity> for BookDto {
    fn from(other: &BookEntity) -> Self {
        Self {
            book_id: other.book_id.to_string(),
            version: other.version,
            title: other.title.to_string(),
            author: other.author.to_string(),
            isbn: other.isbn.clone(),
            published_year: other.published_year,
            genre: other.genre.clone(),
            description: other.description.clone(),
            quantity: other.quantity,
            available: other.available,
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

impl From<&BookDto> for BookEntity {
    fn from(other: &BookDto) -> Self {
        Self {
            book_id: other.book_id.to_string(),
            version: other.version,
            title: other.title.to_string(),
            author: other.author.to_string(),
            isbn: other.isbn.clone(),
            published_year: other.published_year,
            genre: other.genre.clone(),
            description: other.description.clone(),
            quantity: other.quantity,
            available: other.available,
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

// BookChanges carries catalog fields from a request. None leaves a field as is on
// update. Availability is not among them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
}

impl BookChanges {
    pub fn apply(&self, book: &mut BookEntity) {
        if let Some(title) = &self.title {
            book.title = title.trim().to_string();
        }
        if let Some(author) = &self.author {
            book.author = author.trim().to_string();
        }
        if self.isbn.is_some() {
            book.isbn = self.isbn.clone();
        }
        if self.published_year.is_some() {
            book.published_year = self.published_year;
        }
        if self.genre.is_some() {
            book.genre = self.genre.clone();
        }
        if self.description.is_some() {
            book.description = self.description.clone();
        }
        if let Some(quantity) = self.quantity {
            book.quantity = quantity;
        }
    }
}

// BookFilter narrows a catalog search. Text fields match case-insensitive substrings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct BookFilter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub available: Option<bool>,
}
