use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::core::library::LoanStatus;
use crate::loans::domain::model::LoanEntity;
use crate::utils::date::{opt_serializer, serializer};

// LoanDto is the loan as callers see it: an active loan read after its due date
// reports `overdue`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub(crate) struct LoanDto {
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

impl LoanDto {
    pub fn project(other: &LoanEntity, now: NaiveDateTime) -> LoanDto {
        let loan_status = if other.loan_status == LoanStatus::Active && other.due_date < now {
            LoanStatus::Overdue
        } else {
            other.loan_status
        };
        LoanDto {
            loan_id: other.loan_id.to_string(),
            version: other.version,
            branch_id: other.branch_id.to_string(),
            user_id: other.user_id.to_string(),
            book_id: other.book_id.to_string(),
            loan_status,
            loan_date: other.loan_date,
            due_date: other.due_date,
            return_date: other.return_date,
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

impl Identifiable for LoanDto {
    fn id(&self) -> String {
        self.loan_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// LoanFilter narrows a loan listing; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct LoanFilter {
    pub user_id: Option<String>,
    pub book_id: Option<String>,
    pub status: Option<LoanStatus>,
}
