use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::PoisonError;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum LibraryError {
    Database {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    // The store could not be reached or throttled the request; the caller may retry.
    CurrentlyUnavailable {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    Unauthorized {
        message: String,
    },
    Forbidden {
        message: String,
        reason_code: Option<String>,
    },
    // A conditional write lost against the current state of the record, e.g. the
    // book was already checked out or the loan was already returned.
    Conflict {
        message: String,
    },
    NotFound {
        message: String,
    },
    Validation {
        message: String,
        reason_code: Option<String>,
    },
    Serialization {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
    },
}

impl LibraryError {
    pub fn database(message: &str, reason_code: Option<String>, retryable: bool) -> LibraryError {
        LibraryError::Database { message: message.to_string(), reason_code, retryable }
    }

    pub fn unavailable(message: &str, reason_code: Option<String>, retryable: bool) -> LibraryError {
        LibraryError::CurrentlyUnavailable { message: message.to_string(), reason_code, retryable }
    }

    pub fn unauthorized(message: &str) -> LibraryError {
        LibraryError::Unauthorized { message: message.to_string() }
    }

    pub fn forbidden(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Forbidden { message: message.to_string(), reason_code }
    }

    pub fn conflict(message: &str) -> LibraryError {
        LibraryError::Conflict { message: message.to_string() }
    }

    pub fn not_found(message: &str) -> LibraryError {
        LibraryError::NotFound { message: message.to_string() }
    }

    pub fn database_or_unavailable(message: &str, reason: Option<String>, retryable: bool) -> LibraryError {
        if retryable {
            LibraryError::unavailable(
                format!("database unavailable error {:?} {:?}", message, reason).as_str(), reason, true)
        } else if let Some(ref reason_val) = reason {
            if reason_val.as_str().contains("404") {
                LibraryError::not_found(
                    format!("not found error {:?} {:?}", message, reason).as_str())
            } else if reason_val.as_str().contains("ConditionalCheckFailed") {
                LibraryError::conflict(
                    format!("conditional check failed {:?}", message).as_str())
            } else {
                LibraryError::database(
                    format!("database error {:?} {:?}", message, reason).as_str(), reason, false)
            }
        } else {
            LibraryError::database(
                format!("database error {:?} {:?}", message, reason).as_str(), reason, false)
        }
    }

    pub fn validation(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Validation { message: message.to_string(), reason_code }
    }

    pub fn serialization(message: &str) -> LibraryError {
        LibraryError::Serialization { message: message.to_string() }
    }

    pub fn runtime(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Runtime { message: message.to_string(), reason_code }
    }

    pub fn retryable(&self) -> bool {
        match self {
            LibraryError::Database { retryable, .. } => { *retryable }
            LibraryError::CurrentlyUnavailable { retryable, .. } => { *retryable }
            LibraryError::Unauthorized { .. } => { false }
            LibraryError::Forbidden { .. } => { false }
            LibraryError::Conflict { .. } => { false }
            LibraryError::NotFound { .. } => { false }
            LibraryError::Validation { .. } => { false }
            LibraryError::Serialization { .. } => { false }
            LibraryError::Runtime { .. } => { false }
        }
    }
}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::runtime(
            format!("io {:?}", err).as_str(), None)
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::serialization(
            format!("serde json parsing {:?}", err).as_str())
    }
}

impl From<String> for LibraryError {
    fn from(err: String) -> Self {
        LibraryError::serialization(
            format!("serde parsing {:?}", err).as_str())
    }
}

impl From<bcrypt::BcryptError> for LibraryError {
    fn from(err: bcrypt::BcryptError) -> Self {
        LibraryError::runtime(
            format!("password hashing {:?}", err).as_str(), None)
    }
}

impl<T> From<PoisonError<T>> for LibraryError {
    fn from(_: PoisonError<T>) -> Self {
        LibraryError::runtime("store lock poisoned", None)
    }
}

impl Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Database { message, reason_code, retryable } => {
                write!(f, "{} {:?} {}", message, reason_code, retryable)
            }
            LibraryError::CurrentlyUnavailable { message, reason_code, retryable } => {
                write!(f, "{} {:?} {}", message, reason_code, retryable)
            }
            LibraryError::Unauthorized { message } => {
                write!(f, "{}", message)
            }
            LibraryError::Forbidden { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
            LibraryError::Conflict { message } => {
                write!(f, "{}", message)
            }
            LibraryError::NotFound { message } => {
                write!(f, "{}", message)
            }
            LibraryError::Validation { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
            LibraryError::Serialization { message } => {
                write!(f, "{}", message)
            }
            LibraryError::Runtime { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
        }
    }
}

/// A specialized Result type for library operations.
pub type LibraryResult<T> = Result<T, LibraryError>;

// It defines abstraction for paginated result
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResult<T> {
    // The page number or token
    pub page: Option<String>,
    // page size
    pub page_size: usize,
    // Next page if available
    pub next_page: Option<String>,
    // list of records
    pub records: Vec<T>,
}

impl<T> PaginatedResult<T> {
    pub(crate) fn new(page: Option<&str>, page_size: usize,
                      next_page: Option<String>, records: Vec<T>) -> Self {
        PaginatedResult {
            page: page.map(str::to_string),
            page_size,
            next_page,
            records,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

// Only Active and Returned are stored; Overdue is derived from due_date when a loan is read.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Returned,
    Overdue,
}

impl LoanStatus {
    pub fn parse(s: &str) -> Option<LoanStatus> {
        match s {
            "active" => Some(LoanStatus::Active),
            "returned" => Some(LoanStatus::Returned),
            "overdue" => Some(LoanStatus::Overdue),
            _ => None,
        }
    }
}

impl From<String> for LoanStatus {
    fn from(s: String) -> Self {
        LoanStatus::parse(s.as_str()).unwrap_or(LoanStatus::Active)
    }
}

impl Display for LoanStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LoanStatus::Active => write!(f, "active"),
            LoanStatus::Returned => write!(f, "returned"),
            LoanStatus::Overdue => write!(f, "overdue"),
        }
    }
}
