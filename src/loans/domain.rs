pub mod model;
pub mod service;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use crate::auth::domain::Principal;
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::loans::dto::{LoanDto, LoanFilter};

#[async_trait]
pub(crate) trait LoanService: Sync + Send {
    // due_date defaults to the configured loan period
    async fn create_loan(&self, user_id: &str, book_id: &str, due_date: Option<NaiveDateTime>) -> LibraryResult<LoanDto>;
    async fn return_loan(&self, loan_id: &str, requester: &Principal) -> LibraryResult<LoanDto>;
    async fn list_loans(&self, requester: &Principal, filter: &LoanFilter,
                        page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>>;
    async fn get_loan_by_id(&self, loan_id: &str, requester: &Principal) -> LibraryResult<LoanDto>;
    async fn query_overdue(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>>;
}
