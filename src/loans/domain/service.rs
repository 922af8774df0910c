use std::collections::HashMap;
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use tracing::{info, warn};
use crate::auth::domain::Principal;
use crate::books::repository::BookRepository;
use crate::core::clock::Clock;
use crate::core::domain::Configuration;
use crate::core::library::{LibraryError, LibraryResult, LoanStatus, PaginatedResult};
use crate::loans::domain::LoanService;
use crate::loans::domain::model::LoanEntity;
use crate::loans::dto::{LoanDto, LoanFilter};
use crate::loans::repository::LoanRepository;
use crate::users::repository::UserRepository;
use crate::utils::date::format_date;

pub(crate) struct LoanServiceImpl {
    branch_id: String,
    loan_days: i64,
    loan_repository: Box<dyn LoanRepository>,
    book_repository: Box<dyn BookRepository>,
    user_repository: Box<dyn UserRepository>,
    clock: Box<dyn Clock>,
}

impl LoanServiceImpl {
    pub(crate) fn new(config: &Configuration, loan_repository: Box<dyn LoanRepository>,
                      book_repository: Box<dyn BookRepository>, user_repository: Box<dyn UserRepository>,
                      clock: Box<dyn Clock>) -> Self {
        Self {
            branch_id: config.branch_id.to_string(),
            loan_days: config.loan_days,
            loan_repository,
            book_repository,
            user_repository,
            clock,
        }
    }

    async fn load_accessible(&self, loan_id: &str, requester: &Principal) -> LibraryResult<LoanEntity> {
        let loan = self.loan_repository.get(loan_id).await?;
        if !requester.can_access(loan.user_id.as_str()) {
            return Err(LibraryError::forbidden("access denied", None));
        }
        Ok(loan)
    }

    async fn query_projected(&self, predicate: &HashMap<String, String>, now: NaiveDateTime,
                             page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>> {
        let res = self.loan_repository.query(predicate, page, page_size).await?;
        let records = res.records.iter().map(|loan| LoanDto::project(loan, now)).collect();
        Ok(PaginatedResult::new(page, page_size, res.next_page, records))
    }
}

// Overdue is never stored, so a status filter becomes a condition on the stored
// status plus the due date.
fn build_predicate(filter: &LoanFilter, now: NaiveDateTime) -> HashMap<String, String> {
    let mut predicate = HashMap::new();
    if let Some(user_id) = &filter.user_id {
        predicate.insert("user_id".to_string(), user_id.to_string());
    }
    if let Some(book_id) = &filter.book_id {
        predicate.insert("book_id".to_string(), book_id.to_string());
    }
    match filter.status {
        Some(LoanStatus::Active) => {
            predicate.insert("loan_status".to_string(), LoanStatus::Active.to_string());
            predicate.insert("due_date:>=".to_string(), format_date(now));
        }
        Some(LoanStatus::Overdue) => {
            predicate.insert("loan_status".to_string(), LoanStatus::Active.to_string());
            predicate.insert("due_date:<".to_string(), format_date(now));
        }
        Some(LoanStatus::Returned) => {
            predicate.insert("loan_status".to_string(), LoanStatus::Returned.to_string());
        }
        None => {}
    }
    predicate
}

#[async_trait]
impl LoanService for LoanServiceImpl {
    async fn create_loan(&self, user_id: &str, book_id: &str, due_date: Option<NaiveDateTime>) -> LibraryResult<LoanDto> {
        let (user_id, book_id) = (user_id.trim(), book_id.trim());
        if user_id.is_empty() || book_id.is_empty() {
            return Err(LibraryError::validation("user_id and book_id are required", None));
        }
        let now = self.clock.now();
        let due_date = match due_date {
            Some(due) if due <= now => {
                return Err(LibraryError::validation("due_date must be in the future", Some("due_date".to_string())));
            }
            Some(due) => due,
            None => now + Duration::days(self.loan_days),
        };
        let _ = self.user_repository.get(user_id).await?;
        let book = self.book_repository.get(book_id).await?;
        if !book.available {
            return Err(LibraryError::conflict("book not available for loan"));
        }

        let mut loan = LoanEntity::new(user_id, book_id, now, due_date);
        loan.branch_id = self.branch_id.to_string();
        // the availability check above is advisory; the transaction decides races
        self.loan_repository.create_with_checkout(&loan).await.map_err(|err| {
            if let LibraryError::Conflict { .. } = err {
                warn!(book_id, user_id, "lost checkout race");
            }
            err
        })?;
        info!(loan_id = loan.loan_id.as_str(), book_id, user_id, due_date = %format_date(due_date), "created loan");
        Ok(LoanDto::project(&loan, now))
    }

    async fn return_loan(&self, loan_id: &str, requester: &Principal) -> LibraryResult<LoanDto> {
        let mut loan = self.load_accessible(loan_id, requester).await?;
        if !loan.is_active() {
            return Err(LibraryError::conflict("loan already returned"));
        }
        let now = self.clock.now();
        loan.loan_status = LoanStatus::Returned;
        loan.return_date = Some(now);
        loan.updated_at = now;
        self.loan_repository.update_with_return(&loan).await?;
        loan.version += 1;
        info!(loan_id, book_id = loan.book_id.as_str(), "returned loan");
        Ok(LoanDto::project(&loan, now))
    }

    async fn list_loans(&self, requester: &Principal, filter: &LoanFilter,
                        page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>> {
        let mut filter = filter.clone();
        if !requester.is_admin() {
            filter.user_id = Some(requester.user_id.to_string());
        }
        let now = self.clock.now();
        self.query_projected(&build_predicate(&filter, now), now, page, page_size).await
    }

    async fn get_loan_by_id(&self, loan_id: &str, requester: &Principal) -> LibraryResult<LoanDto> {
        let loan = self.load_accessible(loan_id, requester).await?;
        Ok(LoanDto::project(&loan, self.clock.now()))
    }

    async fn query_overdue(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>> {
        let now = self.clock.now();
        let filter = LoanFilter { status: Some(LoanStatus::Overdue), ..LoanFilter::default() };
        self.query_projected(&build_predicate(&filter, now), now, page, page_size).await
    }
}
