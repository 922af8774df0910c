pub mod ddb_loan_repository;
pub mod memory_loan_repository;

use async_trait::async_trait;
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;
use crate::loans::domain::model::LoanEntity;

#[async_trait]
pub(crate) trait LoanRepository: Repository<LoanEntity> {
    // Stores a new active loan and marks its book unavailable in one transaction.
    // Fails with Conflict, writing nothing, unless the book is still available.
    async fn create_with_checkout(&self, loan: &LoanEntity) -> LibraryResult<()>;

    // Stores the returned loan and marks its book available in one transaction.
    // `loan.version` must be the version read; fails with Conflict, writing nothing,
    // if the stored loan moved on or is no longer active.
    async fn update_with_return(&self, loan: &LoanEntity) -> LibraryResult<()>;
}
