use chrono::NaiveDateTime;
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::utils::date::serializer;

// BookEntity is a catalogued title. `available` is false exactly while an active loan
// references the book; only the loan transactions flip it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct BookEntity {
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

impl BookEntity {
    pub fn new(title: &str, author: &str, now: NaiveDateTime) -> Self {
        Self {
            book_id: Uuid::new_v4().to_string(),
            version: 0,
            title: title.to_string(),
            author: author.to_string(),
            isbn: None,
            published_year: None,
            genre: None,
            description: None,
            quantity: 1,
            available: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Identifiable for BookEntity {
    fn id(&self) -> String {
        self.book_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use crate::books::domain::model::BookEntity;

    #[tokio::test]
    async fn test_should_build_books() {
        let book = BookEntity::new("Dune", "Frank Herbert", Utc::now().naive_utc());
        assert_eq!("Dune", book.title.as_str());
        assert_eq!("Frank Herbert", book.author.as_str());
        assert_eq!(1, book.quantity);
        assert!(book.available);
        assert_eq!(0, book.version);
    }
}
