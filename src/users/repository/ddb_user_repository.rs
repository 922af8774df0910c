use std::cmp;
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, TransactWriteItem};

use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::users::domain::model::{normalize_email, UserEntity};
use crate::users::repository::UserRepository;
use crate::utils::ddb::{FilterExpr, from_ddb, opt_string, parse_item, string_date, to_ddb_page};

// Each e-mail owns a marker item `email#<address>` in the users table; writing it in the
// same transaction as the user makes the address unique.
const EMAIL_MARKER: &str = "email#";
const MAX_SCAN_PAGES: usize = 50;

#[derive(Debug)]
pub(crate) struct DDBUserRepository {
    client: Client,
    table_name: String,
    index_name: String,
}

impl DDBUserRepository {
    pub(crate) fn new(client: Client, table_name: &str, index_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
            index_name: index_name.to_string(),
        }
    }

    fn marker_key(email: &str) -> AttributeValue {
        AttributeValue::S(format!("{}{}", EMAIL_MARKER, normalize_email(email)))
    }

    async fn scan(&self, filter: FilterExpr, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<UserEntity>> {
        let table_name: &str = self.table_name.as_ref();
        // marker items carry no email attribute
        let expr = if filter.expr.is_empty() {
            "attribute_exists(email)".to_string()
        } else {
            format!("attribute_exists(email) AND {}", filter.expr)
        };
        let mut request = self.client
            .scan()
            .table_name(table_name)
            .consistent_read(false)
            .set_exclusive_start_key(to_ddb_page(page))
            .limit(cmp::min(page_size, 500) as i32)
            .filter_expression(expr);
        for (k, v) in filter.names {
            request = request.expression_attribute_names(k, v);
        }
        for (k, v) in filter.values {
            request = request.expression_attribute_values(k, v);
        }
        request
            .send()
            .await.map_err(LibraryError::from).map(|req| {
            let records = req.items.as_ref().unwrap_or(&vec![]).iter()
                .map(UserEntity::from).collect();
            from_ddb(page, page_size, req.last_evaluated_key(), records)
        })
    }

    async fn write_refresh_token(&self, user_id: &str, expected: Option<&str>, token: Option<&str>) -> LibraryResult<()> {
        let table_name: &str = self.table_name.as_ref();
        let mut request = self.client
            .update_item()
            .table_name(table_name)
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()));
        request = match token {
            Some(token) => request
                .update_expression("SET refresh_token = :token, version = version + :one")
                .expression_attribute_values(":token", AttributeValue::S(token.to_string())),
            None => request
                .update_expression("REMOVE refresh_token SET version = version + :one"),
        };
        request = match expected {
            Some(expected) => request
                .condition_expression("refresh_token = :expected")
                .expression_attribute_values(":expected", AttributeValue::S(expected.to_string())),
            None => request
                .condition_expression("attribute_exists(user_id)"),
        };
        request.send().await.map(|_| ()).map_err(LibraryError::from)
    }
}

#[async_trait]
impl Repository<UserEntity> for DDBUserRepository {
    async fn create(&self, entity: &UserEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        let val = serde_json::to_value(entity)?;
        let user = Put::builder()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(user_id)")
            .set_item(Some(parse_item(val)?))
            .build();
        let marker = Put::builder()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(user_id)")
            .item("user_id", DDBUserRepository::marker_key(entity.email.as_str()))
            .item("owner_id", AttributeValue::S(entity.user_id.to_string()))
            .build();
        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().put(user).build())
            .transact_items(TransactWriteItem::builder().put(marker).build())
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    // e-mail and refresh token are not part of a profile update
    async fn update(&self, entity: &UserEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();

        self.client
            .update_item()
            .table_name(table_name)
            .key("user_id", AttributeValue::S(entity.user_id.clone()))
            .update_expression("SET version = :version, username = :username, password_hash = :password_hash, #role = :role, external_provider = :external_provider, external_id = :external_id, updated_at = :updated_at")
            .expression_attribute_names("#role", "role")
            .expression_attribute_values(":old_version", AttributeValue::N(entity.version.to_string()))
            .expression_attribute_values(":version", AttributeValue::N((entity.version + 1).to_string()))
            .expression_attribute_values(":username", AttributeValue::S(entity.username.to_string()))
            .expression_attribute_values(":password_hash", AttributeValue::S(entity.password_hash.to_string()))
            .expression_attribute_values(":role", AttributeValue::S(entity.role.to_string()))
            .expression_attribute_values(":external_provider", opt_string(entity.external_provider.as_deref()))
            .expression_attribute_values(":external_id", opt_string(entity.external_id.as_deref()))
            .expression_attribute_values(":updated_at", string_date(entity.updated_at))
            .condition_expression("attribute_exists(version) AND version = :old_version")
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn get(&self, id: &str) -> LibraryResult<UserEntity> {
        let table_name: &str = self.table_name.as_ref();
        if id.starts_with(EMAIL_MARKER) {
            return Err(LibraryError::not_found(format!("user not found for {}", id).as_str()));
        }
        self.client
            .query()
            .table_name(table_name)
            .limit(2)
            .consistent_read(true)
            .key_condition_expression(
                "user_id = :user_id",
            )
            .expression_attribute_values(
                ":user_id",
                AttributeValue::S(id.to_string()),
            )
            .send()
            .await.map_err(LibraryError::from).and_then(|req| {
            let items = req.items.unwrap_or_default();
            if items.len() > 1 {
                return Err(LibraryError::database(format!("too many users for {}", id).as_str(), None, false));
            }
            items.first().map(UserEntity::from)
                .ok_or_else(|| LibraryError::not_found(format!("user not found for {}", id).as_str()))
        })
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        let user = self.get(id).await?;
        let delete_user = Delete::builder()
            .table_name(table_name)
            .key("user_id", AttributeValue::S(id.to_string()))
            .build();
        let delete_marker = Delete::builder()
            .table_name(table_name)
            .key("user_id", DDBUserRepository::marker_key(user.email.as_str()))
            .build();
        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().delete(delete_user).build())
            .transact_items(TransactWriteItem::builder().delete(delete_marker).build())
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    // Note you cannot use certain reserved words per https://docs.aws.amazon.com/amazondynamodb/latest/developerguide/ReservedWords.html
    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<UserEntity>> {
        self.scan(FilterExpr::from_predicate(predicate, &[]), page, page_size).await
    }
}

#[async_trait]
impl UserRepository for DDBUserRepository {
    async fn find_by_email(&self, email: &str) -> LibraryResult<Option<UserEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let index_name: &str = self.index_name.as_ref();
        self.client
            .query()
            .table_name(table_name)
            .index_name(index_name)
            .limit(1)
            .key_condition_expression("email = :email")
            .expression_attribute_values(":email", AttributeValue::S(normalize_email(email)))
            .send()
            .await.map_err(LibraryError::from).map(|req| {
            req.items.unwrap_or_default().first().map(UserEntity::from)
        })
    }

    async fn find_by_external_id(&self, provider: &str, external_id: &str) -> LibraryResult<Option<UserEntity>> {
        let predicate = HashMap::from([
            ("external_provider".to_string(), provider.to_string()),
            ("external_id".to_string(), external_id.to_string()),
        ]);
        let mut page: Option<String> = None;
        for _ in 0..MAX_SCAN_PAGES {
            let res = self.scan(FilterExpr::from_predicate(&predicate, &[]), page.as_deref(), 500).await?;
            if let Some(user) = res.records.into_iter().next() {
                return Ok(Some(user));
            }
            page = res.next_page;
            if page.is_none() {
                break;
            }
        }
        Ok(None)
    }

    async fn save_refresh_token(&self, user_id: &str, token: Option<&str>) -> LibraryResult<()> {
        self.write_refresh_token(user_id, None, token).await
    }

    async fn swap_refresh_token(&self, user_id: &str, expected: &str, token: Option<&str>) -> LibraryResult<bool> {
        match self.write_refresh_token(user_id, Some(expected), token).await {
            Ok(()) => Ok(true),
            Err(LibraryError::Conflict { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use aws_sdk_dynamodb::Client;
    use chrono::Utc;
    use lazy_static::lazy_static;
    use uuid::Uuid;

    use crate::core::library::Role;
    use crate::core::repository::{Repository, RepositoryStore};
    use crate::users::domain::model::UserEntity;
    use crate::users::repository::UserRepository;
    use crate::users::repository::ddb_user_repository::DDBUserRepository;
    use crate::utils::ddb::{build_db_client, create_table, delete_table};

    lazy_static! {
        static ref CLIENT: AsyncOnce<Client> = AsyncOnce::new(async {
                let client = build_db_client(RepositoryStore::LocalDynamoDB).await;
                let _ = delete_table(&client, "users").await;
                let _ = create_table(&client, "users", "user_id", "email", "username").await;
                client
            });
    }

    fn new_user() -> UserEntity {
        UserEntity::new("ana", format!("{}@example.com", Uuid::new_v4()).as_str(), "hash", Role::User, Utc::now().naive_utc())
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB Local on localhost:8000"]
    async fn test_should_create_get_users() {
        let users_repo = DDBUserRepository::new(CLIENT.get().await.clone(), "users", "users_ndx");
        let user = new_user();
        assert_eq!(1, users_repo.create(&user).await.expect("should create user"));
        let loaded = users_repo.get(user.user_id.as_str()).await.expect("should return user");
        assert_eq!(user.email, loaded.email);
        let found = users_repo.find_by_email(user.email.as_str()).await.expect("should query by email");
        assert_eq!(Some(user.user_id.clone()), found.map(|u| u.user_id));
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB Local on localhost:8000"]
    async fn test_should_reject_duplicate_email() {
        let users_repo = DDBUserRepository::new(CLIENT.get().await.clone(), "users", "users_ndx");
        let user = new_user();
        users_repo.create(&user).await.expect("should create user");
        let mut other = new_user();
        other.email = user.email.clone();
        assert!(users_repo.create(&other).await.is_err());
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB Local on localhost:8000"]
    async fn test_should_swap_refresh_token() {
        let users_repo = DDBUserRepository::new(CLIENT.get().await.clone(), "users", "users_ndx");
        let user = new_user();
        users_repo.create(&user).await.expect("should create user");
        users_repo.save_refresh_token(user.user_id.as_str(), Some("r1")).await.expect("should save token");
        assert!(users_repo.swap_refresh_token(user.user_id.as_str(), "r1", Some("r2")).await.unwrap());
        assert!(!users_repo.swap_refresh_token(user.user_id.as_str(), "r1", Some("r3")).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB Local on localhost:8000"]
    async fn test_should_delete_users() {
        let users_repo = DDBUserRepository::new(CLIENT.get().await.clone(), "users", "users_ndx");
        let user = new_user();
        users_repo.create(&user).await.expect("should create user");
        assert_eq!(1, users_repo.delete(user.user_id.as_str()).await.expect("should delete user"));
        // the address is free again
        let mut again = new_user();
        again.email = user.email.clone();
        users_repo.create(&again).await.expect("should reuse email");
    }
}
