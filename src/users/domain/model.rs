use std::collections::HashMap;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::domain::Identifiable;
use crate::core::library::Role;
use crate::utils::date::serializer;
use crate::utils::ddb::{parse_date_attribute, parse_number_attribute, parse_string_attribute};

// UserEntity is an account of the library. `refresh_token` holds the single live
// refresh token of the account, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct UserEntity {
    pub user_id: String,
    pub version: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub external_provider: Option<String>,
    pub external_id: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl UserEntity {
    pub fn new(username: &str, email: &str, password_hash: &str, role: Role, now: NaiveDateTime) -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            version: 0,
            username: username.to_string(),
            email: normalize_email(email),
            password_hash: password_hash.to_string(),
            role,
            external_provider: None,
            external_id: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Identifiable for UserEntity {
    fn id(&self) -> String {
        self.user_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl From<&HashMap<String, AttributeValue>> for UserEntity {
    fn from(map: &HashMap<String, AttributeValue>) -> Self {
        UserEntity {
            user_id: parse_string_attribute("user_id", map).unwrap_or_default(),
            version: parse_number_attribute("version", map),
            username: parse_string_attribute("username", map).unwrap_or_default(),
            email: parse_string_attribute("email", map).unwrap_or_default(),
            password_hash: parse_string_attribute("password_hash", map).unwrap_or_default(),
            role: Role::from(parse_string_attribute("role", map).unwrap_or_default()),
            external_provider: parse_string_attribute("external_provider", map),
            external_id: parse_string_attribute("external_id", map),
            refresh_token: parse_string_attribute("refresh_token", map),
            created_at: parse_date_attribute("created_at", map).unwrap_or(Utc::now().naive_utc()),
            updated_at: parse_date_attribute("updated_at", map).unwrap_or(Utc::now().naive_utc()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use crate::core::library::Role;
    use crate::users::domain::model::UserEntity;
    use crate::utils::ddb::parse_item;

    #[tokio::test]
    async fn test_should_build_users() {
        let user = UserEntity::new("ana", " Ana@Example.com ", "hash", Role::User, Utc::now().naive_utc());
        assert_eq!("ana@example.com", user.email.as_str());
        assert_eq!(None, user.refresh_token);
    }

    #[tokio::test]
    async fn test_should_map_from_item() {
        let mut user = UserEntity::new("ana", "ana@example.com", "hash", Role::Admin, Utc::now().naive_utc());
        user.refresh_token = Some("token".to_string());
        let item = parse_item(serde_json::to_value(&user).unwrap()).unwrap();
        assert_eq!(user, UserEntity::from(&item));
    }
}
