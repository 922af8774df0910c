use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::core::library::Role;
use crate::users::domain::model::UserEntity;
use crate::utils::date::serializer;

// UserDto is what leaves the service; credentials stay in UserEntity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct UserDto {
    pub user_id: String,
    pub version: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub external_provider: Option<String>,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

// UserChanges lists the profile fields a caller may change; None leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct UserChanges {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl Identifiable for UserDto {
    fn id(&self) -> String {
        self.user_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl From<&UserEntity> for UserDto {
    fn from(other: &UserEntity) -> Self {
        Self {
            user_id: other.user_id.to_string(),
            version: other.version,
            username: other.username.to_string(),
            email: other.email.to_string(),
            role: other.role,
            external_provider: other.external_provider.clone(),
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}
