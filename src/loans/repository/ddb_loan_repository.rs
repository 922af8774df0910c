use std::cmp;
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem, Update};

use crate::core::library::{LibraryError, LibraryResult, LoanStatus, PaginatedResult};
use crate::core::repository::Repository;
use crate::loans::domain::model::LoanEntity;
use crate::loans::repository::LoanRepository;
use crate::utils::ddb::{FilterExpr, from_ddb, opt_string_date, parse_item, string_date, to_ddb_page};

#[derive(Debug)]
pub(crate) struct DDBLoanRepository {
    client: Client,
    table_name: String,
    index_name: String,
    books_table_name: String,
}

impl DDBLoanRepository {
    pub(crate) fn new(client: Client, table_name: &str, index_name: &str, books_table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
            index_name: index_name.to_string(),
            books_table_name: books_table_name.to_string(),
        }
    }

    fn set_book_availability(&self, book_id: &str, available: bool, expected: Option<bool>,
                             updated_at: AttributeValue) -> Update {
        let condition = match expected {
            Some(_) => "attribute_exists(book_id) AND #available = :expected",
            None => "attribute_exists(book_id)",
        };
        let mut update = Update::builder()
            .table_name(self.books_table_name.as_str())
            .key("book_id", AttributeValue::S(book_id.to_string()))
            .update_expression("SET #available = :available, version = version + :one, updated_at = :updated_at")
            .condition_expression(condition)
            .expression_attribute_names("#available", "available")
            .expression_attribute_values(":available", AttributeValue::Bool(available))
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .expression_attribute_values(":updated_at", updated_at);
        if let Some(expected) = expected {
            update = update.expression_attribute_values(":expected", AttributeValue::Bool(expected));
        }
        update.build()
    }
}

#[async_trait]
impl Repository<LoanEntity> for DDBLoanRepository {
    async fn create(&self, entity: &LoanEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        let val = serde_json::to_value(entity)?;
        self.client
            .put_item()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(loan_id)")
            .set_item(Some(parse_item(val)?))
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn update(&self, entity: &LoanEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();

        self.client
            .update_item()
            .table_name(table_name)
            .key("loan_id", AttributeValue::S(entity.loan_id.clone()))
            .update_expression("SET version = :version, loan_status = :loan_status, due_date = :due_date, return_date = :return_date, updated_at = :updated_at")
            .expression_attribute_values(":old_version", AttributeValue::N(entity.version.to_string()))
            .expression_attribute_values(":version", AttributeValue::N((entity.version + 1).to_string()))
            .expression_attribute_values(":loan_status", AttributeValue::S(entity.loan_status.to_string()))
            .expression_attribute_values(":due_date", string_date(entity.due_date))
            .expression_attribute_values(":return_date", opt_string_date(entity.return_date))
            .expression_attribute_values(":updated_at", string_date(entity.updated_at))
            .condition_expression("attribute_exists(version) AND version = :old_version")
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn get(&self, id: &str) -> LibraryResult<LoanEntity> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .query()
            .table_name(table_name)
            .limit(2)
            .consistent_read(true)
            .key_condition_expression(
                "loan_id = :loan_id",
            )
            .expression_attribute_values(
                ":loan_id",
                AttributeValue::S(id.to_string()),
            )
            .send()
            .await.map_err(LibraryError::from).and_then(|req| {
            let items = req.items.unwrap_or_default();
            if items.len() > 1 {
                return Err(LibraryError::database(format!("too many loans for {}", id).as_str(), None, false));
            }
            items.first().map(LoanEntity::from)
                .ok_or_else(|| LibraryError::not_found(format!("loan not found for {}", id).as_str()))
        })
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client.delete_item()
            .table_name(table_name)
            .key("loan_id", AttributeValue::S(id.to_string()))
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    // Queries the user index when the predicate names a user, otherwise scans.
    // Note you cannot use certain reserved words per https://docs.aws.amazon.com/amazondynamodb/latest/developerguide/ReservedWords.html
    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let index_name: &str = self.index_name.as_ref();
        let exclusive_start_key = to_ddb_page(page);
        let limit = cmp::min(page_size, 500) as i32;
        let filter = FilterExpr::from_predicate(predicate, &["user_id"]);

        let (items, last_key) = if let Some(user_id) = predicate.get("user_id") {
            let mut request = self.client
                .query()
                .table_name(table_name)
                .index_name(index_name)
                .limit(limit)
                .consistent_read(false)
                .set_exclusive_start_key(exclusive_start_key)
                .key_condition_expression("user_id = :user_id")
                .expression_attribute_values(":user_id", AttributeValue::S(user_id.to_string()));
            if !filter.expr.is_empty() {
                request = request.filter_expression(filter.expr);
                for (k, v) in filter.names {
                    request = request.expression_attribute_names(k, v);
                }
                for (k, v) in filter.values {
                    request = request.expression_attribute_values(k, v);
                }
            }
            let res = request.send().await.map_err(LibraryError::from)?;
            (res.items.unwrap_or_default(), res.last_evaluated_key)
        } else {
            let mut request = self.client
                .scan()
                .table_name(table_name)
                .limit(limit)
                .consistent_read(false)
                .set_exclusive_start_key(exclusive_start_key);
            if !filter.expr.is_empty() {
                request = request.filter_expression(filter.expr);
                for (k, v) in filter.names {
                    request = request.expression_attribute_names(k, v);
                }
                for (k, v) in filter.values {
                    request = request.expression_attribute_values(k, v);
                }
            }
            let res = request.send().await.map_err(LibraryError::from)?;
            (res.items.unwrap_or_default(), res.last_evaluated_key)
        };
        let records = items.iter().map(LoanEntity::from).collect();
        Ok(from_ddb(page, page_size, last_key.as_ref(), records))
    }
}

#[async_trait]
impl LoanRepository for DDBLoanRepository {
    async fn create_with_checkout(&self, loan: &LoanEntity) -> LibraryResult<()> {
        let table_name: &str = self.table_name.as_ref();
        let val = serde_json::to_value(loan)?;
        let put = Put::builder()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(loan_id)")
            .set_item(Some(parse_item(val)?))
            .build();
        let checkout = self.set_book_availability(
            loan.book_id.as_str(), false, Some(true), string_date(loan.created_at));
        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().update(checkout).build())
            .transact_items(TransactWriteItem::builder().put(put).build())
            .send()
            .await.map(|_| ()).map_err(|err| match LibraryError::from(err) {
            LibraryError::Conflict { .. } => LibraryError::conflict("book not available for loan"),
            other => other,
        })
    }

    async fn update_with_return(&self, loan: &LoanEntity) -> LibraryResult<()> {
        let table_name: &str = self.table_name.as_ref();
        let returned = Update::builder()
            .table_name(table_name)
            .key("loan_id", AttributeValue::S(loan.loan_id.clone()))
            .update_expression("SET version = :version, loan_status = :loan_status, return_date = :return_date, updated_at = :updated_at")
            .condition_expression("version = :old_version AND loan_status = :active")
            .expression_attribute_values(":old_version", AttributeValue::N(loan.version.to_string()))
            .expression_attribute_values(":version", AttributeValue::N((loan.version + 1).to_string()))
            .expression_attribute_values(":active", AttributeValue::S(LoanStatus::Active.to_string()))
            .expression_attribute_values(":loan_status", AttributeValue::S(loan.loan_status.to_string()))
            .expression_attribute_values(":return_date", opt_string_date(loan.return_date))
            .expression_attribute_values(":updated_at", string_date(loan.updated_at))
            .build();
        let release = self.set_book_availability(
            loan.book_id.as_str(), true, None, string_date(loan.updated_at));
        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().update(returned).build())
            .transact_items(TransactWriteItem::builder().update(release).build())
            .send()
            .await.map(|_| ()).map_err(|err| match LibraryError::from(err) {
            LibraryError::Conflict { .. } => LibraryError::conflict("loan already returned"),
            other => other,
        })
    }
}
