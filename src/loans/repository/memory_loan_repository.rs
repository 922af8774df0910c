use std::collections::HashMap;
use async_trait::async_trait;
use crate::core::library::{LibraryError, LibraryResult, LoanStatus};
use crate::loans::domain::model::LoanEntity;
use crate::loans::repository::LoanRepository;
use crate::utils::memory::{MemoryRecord, MemoryRepository, MemoryTables};
use crate::utils::date::format_date;

pub(crate) type MemoryLoanRepository = MemoryRepository<LoanEntity>;

impl MemoryRecord for LoanEntity {
    const NAME: &'static str = "loan";

    fn table(tables: &mut MemoryTables) -> &mut HashMap<String, Self> {
        &mut tables.loans
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    fn sort_key(&self) -> String {
        format!("{}/{}", format_date(self.loan_date), self.loan_id)
    }
}

#[async_trait]
impl LoanRepository for MemoryLoanRepository {
    async fn create_with_checkout(&self, loan: &LoanEntity) -> LibraryResult<()> {
        let mut tables = self.db.lock()?;
        if tables.loans.contains_key(loan.loan_id.as_str()) {
            return Err(LibraryError::conflict(format!("loan {} already exists", loan.loan_id).as_str()));
        }
        let book = tables.books.get_mut(loan.book_id.as_str())
            .ok_or_else(|| LibraryError::conflict("book not available for loan"))?;
        if !book.available {
            return Err(LibraryError::conflict("book not available for loan"));
        }
        book.available = false;
        book.version += 1;
        book.updated_at = loan.created_at;
        tables.loans.insert(loan.loan_id.to_string(), loan.clone());
        Ok(())
    }

    async fn update_with_return(&self, loan: &LoanEntity) -> LibraryResult<()> {
        let mut tables = self.db.lock()?;
        let stored = tables.loans.get(loan.loan_id.as_str())
            .ok_or_else(|| LibraryError::not_found(format!("loan not found for {}", loan.loan_id).as_str()))?;
        if stored.loan_status != LoanStatus::Active || stored.version != loan.version {
            return Err(LibraryError::conflict("loan already returned"));
        }
        let book = tables.books.get_mut(loan.book_id.as_str())
            .ok_or_else(|| LibraryError::conflict(format!("book {} of the loan is missing", loan.book_id).as_str()))?;
        book.available = true;
        book.version += 1;
        book.updated_at = loan.updated_at;
        let mut next = loan.clone();
        next.version = loan.version + 1;
        tables.loans.insert(loan.loan_id.to_string(), next);
        Ok(())
    }
}
