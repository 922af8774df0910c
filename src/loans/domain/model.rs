use std::collections::HashMap;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::domain::Identifiable;
use crate::core::library::LoanStatus;
use crate::utils::date::{opt_serializer, serializer};
use crate::utils::ddb::{parse_date_attribute, parse_number_attribute, parse_string_attribute};

// LoanEntity records one book lent to one user. The stored status is only ever
// active or returned.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub(crate) struct LoanEntity {
    pub loan_id: String,
    pub version: i64,
    pub branch_id: String,
    pub user_id: String,
    pub book_id: String,
    pub loan_status: LoanStatus,
    #[serde(with = "serializer")]
    pub loan_date: NaiveDateTime,
    #[serde(with = "serializer")]
    pub due_date: NaiveDateTime,
    #[serde(with = "opt_serializer")]
    pub return_date: Option<NaiveDateTime>,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl LoanEntity {
    pub fn new(user_id: &str, book_id: &str, loan_date: NaiveDateTime, due_date: NaiveDateTime) -> Self {
        Self {
            loan_id: Uuid::new_v4().to_string(),
            version: 0,
            branch_id: String::new(),
            user_id: user_id.to_string(),
            book_id: book_id.to_string(),
            loan_status: LoanStatus::Active,
            loan_date,
            due_date,
            return_date: None,
            created_at: loan_date,
            updated_at: loan_date,
        }
    }

    pub fn is_active(&self) -> bool {
        self.loan_status == LoanStatus::Active
    }
}

impl Identifiable for LoanEntity {
    fn id(&self) -> String {
        self.loan_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl From<&HashMap<String, AttributeValue>> for LoanEntity {
    fn from(map: &HashMap<String, AttributeValue>) -> Self {
        LoanEntity {
            loan_id: parse_string_attribute("loan_id", map).unwrap_or_default(),
            version: parse_number_attribute("version", map),
            branch_id: parse_string_attribute("branch_id", map).unwrap_or_default(),
            user_id: parse_string_attribute("user_id", map).unwrap_or_default(),
            book_id: parse_string_attribute("book_id", map).unwrap_or_default(),
            loan_status: LoanStatus::from(parse_string_attribute("loan_status", map).unwrap_or_default()),
            loan_date: parse_date_attribute("loan_date", map).unwrap_or(Utc::now().naive_utc()),
            due_date: parse_date_attribute("due_date", map).unwrap_or(Utc::now().naive_utc()),
            return_date: parse_date_attribute("return_date", map),
            created_at: parse_date_attribute("created_at", map).unwrap_or(Utc::now().naive_utc()),
            updated_at: parse_date_attribute("updated_at", map).unwrap_or(Utc::now().naive_utc()),
        }
    }
}
