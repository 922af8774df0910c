use std::cmp;
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;

use crate::books::domain::model::BookEntity;
use crate::books::repository::BookRepository;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::ddb::{FilterExpr, from_ddb, opt_string, parse_bool_attribute, parse_date_attribute, parse_item, parse_number_attribute, parse_opt_number_attribute, parse_string_attribute, string_date, to_ddb_page};

// searchable text is kept in lower-cased shadow attributes since `contains` is case-sensitive
const SEARCH_ATTRS: [&str; 3] = ["title", "author", "genre"];

#[derive(Debug)]
pub struct DDBBookRepository {
    client: Client,
    table_name: String,
}

impl DDBBookRepository {
    pub(crate) fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }

    async fn scan(&self, filter: FilterExpr, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let exclusive_start_key = to_ddb_page(page);
        let mut request = self.client
            .scan()
            .table_name(table_name)
            .consistent_read(false)
            .set_exclusive_start_key(exclusive_start_key)
            .limit(cmp::min(page_size, 500) as i32);
        if !filter.expr.is_empty() {
            request = request.filter_expression(filter.expr);
            for (k, v) in filter.names {
                request = request.expression_attribute_names(k, v);
            }
            for (k, v) in filter.values {
                request = request.expression_attribute_values(k, v);
            }
        }
        request
            .send()
            .await.map_err(LibraryError::from).map(|req| {
            let def_items = vec![];
            let items = req.items.as_ref().unwrap_or(&def_items);
            let records = items.iter().map(map_to_book).collect();
            from_ddb(page, page_size, req.last_evaluated_key(), records)
        })
    }
}

#[async_trait]
impl Repository<BookEntity> for DDBBookRepository {
    async fn create(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        let val = serde_json::to_value(entity)?;
        let mut item = parse_item(val)?;
        item.insert("title_lc".to_string(), AttributeValue::S(entity.title.to_lowercase()));
        item.insert("author_lc".to_string(), AttributeValue::S(entity.author.to_lowercase()));
        item.insert("genre_lc".to_string(), AttributeValue::S(entity.genre.clone().unwrap_or_default().to_lowercase()));
        self.client
            .put_item()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(book_id)")
            .set_item(Some(item))
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    // availability is left alone; only the loan transactions write it
    async fn update(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        let published_year = entity.published_year
            .map(|y| AttributeValue::N(y.to_string()))
            .unwrap_or(AttributeValue::Null(true));

        self.client
            .update_item()
            .table_name(table_name)
            .key("book_id", AttributeValue::S(entity.book_id.clone()))
            .update_expression("SET version = :version, title = :title, author = :author, isbn = :isbn, published_year = :published_year, genre = :genre, description = :description, quantity = :quantity, title_lc = :title_lc, author_lc = :author_lc, genre_lc = :genre_lc, updated_at = :updated_at")
            .expression_attribute_values(":old_version", AttributeValue::N(entity.version.to_string()))
            .expression_attribute_values(":version", AttributeValue::N((entity.version + 1).to_string()))
            .expression_attribute_values(":title", AttributeValue::S(entity.title.to_string()))
            .expression_attribute_values(":author", AttributeValue::S(entity.author.to_string()))
            .expression_attribute_values(":isbn", opt_string(entity.isbn.as_deref()))
            .expression_attribute_values(":published_year", published_year)
            .expression_attribute_values(":genre", opt_string(entity.genre.as_deref()))
            .expression_attribute_values(":description", opt_string(entity.description.as_deref()))
            .expression_attribute_values(":quantity", AttributeValue::N(entity.quantity.to_string()))
            .expression_attribute_values(":title_lc", AttributeValue::S(entity.title.to_lowercase()))
            .expression_attribute_values(":author_lc", AttributeValue::S(entity.author.to_lowercase()))
            .expression_attribute_values(":genre_lc", AttributeValue::S(entity.genre.clone().unwrap_or_default().to_lowercase()))
            .expression_attribute_values(":updated_at", string_date(entity.updated_at))
            .condition_expression("attribute_exists(version) AND version = :old_version")
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn get(&self, id: &str) -> LibraryResult<BookEntity> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .query()
            .table_name(table_name)
            .limit(2)
            .consistent_read(true)
            .key_condition_expression(
                "book_id = :book_id",
            )
            .expression_attribute_values(
                ":book_id",
                AttributeValue::S(id.to_string()),
            )
            .send()
            .await.map_err(LibraryError::from).and_then(|req| {
            let items = req.items.unwrap_or_default();
            if items.len() > 1 {
                return Err(LibraryError::database(format!("too many books for {}", id).as_str(), None, false));
            }
            items.first().map(map_to_book)
                .ok_or_else(|| LibraryError::not_found(format!("book not found for {}", id).as_str()))
        })
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client.delete_item()
            .table_name(table_name)
            .key("book_id", AttributeValue::S(id.to_string()))
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    // Note you cannot use certain reserved words per https://docs.aws.amazon.com/amazondynamodb/latest/developerguide/ReservedWords.html
    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        let mut search = HashMap::new();
        for (k, v) in predicate {
            match k.split_once(':') {
                Some((attr, "contains")) if SEARCH_ATTRS.contains(&attr) => {
                    search.insert(format!("{}_lc:contains", attr), v.to_lowercase());
                }
                _ => {
                    search.insert(k.to_string(), v.to_string());
                }
            }
        }
        self.scan(FilterExpr::from_predicate(&search, &[]), page, page_size).await
    }
}

#[async_trait]
impl BookRepository for DDBBookRepository {
    async fn is_available(&self, id: &str) -> LibraryResult<bool> {
        self.get(id).await.map(|book| book.available)
    }

    // a book out on loan is never deleted, even if it went out after the caller looked
    async fn delete_if_available(&self, id: &str) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client.delete_item()
            .table_name(table_name)
            .key("book_id", AttributeValue::S(id.to_string()))
            .condition_expression("attribute_exists(book_id) AND #available = :true")
            .expression_attribute_names("#available", "available")
            .expression_attribute_values(":true", AttributeValue::Bool(true))
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }
}

fn map_to_book(map: &HashMap<String, AttributeValue>) -> BookEntity {
    BookEntity {
        book_id: parse_string_attribute("book_id", map).unwrap_or_default(),
        version: parse_number_attribute("version", map),
        title: parse_string_attribute("title", map).unwrap_or_default(),
        author: parse_string_attribute("author", map).unwrap_or_default(),
        isbn: parse_string_attribute("isbn", map),
        published_year: parse_opt_number_attribute("published_year", map).map(|y| y as i32),
        genre: parse_string_attribute("genre", map),
        description: parse_string_attribute("description", map),
        quantity: parse_number_attribute("quantity", map),
        available: parse_bool_attribute("available", map),
        created_at: parse_date_attribute("created_at", map).unwrap_or(Utc::now().naive_utc()),
        updated_at: parse_date_attribute("updated_at", map).unwrap_or(Utc::now().naive_utc()),
    }
}
