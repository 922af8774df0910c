use crate::books::factory::create_book_repository;
use crate::core::clock::SystemClock;
use crate::core::domain::Configuration;
use crate::core::repository::RepositoryStore;
use crate::loans::domain::LoanService;
use crate::loans::domain::service::LoanServiceImpl;
use crate::loans::factory;
use crate::loans::repository::LoanRepository;
use crate::loans::repository::ddb_loan_repository::DDBLoanRepository;
use crate::loans::repository::memory_loan_repository::MemoryLoanRepository;
use crate::users::factory::create_user_repository;
use crate::utils::ddb::{build_db_client, create_table};
use crate::utils::memory::MemoryDatabase;

pub(crate) async fn create_loan_repository(store: RepositoryStore) -> Box<dyn LoanRepository> {
    match store {
        RepositoryStore::DynamoDB => {
            let client = build_db_client(store).await;
            Box::new(DDBLoanRepository::new(client, "loans", "loans_ndx", "books"))
        }
        RepositoryStore::LocalDynamoDB => {
            let client = build_db_client(store).await;
            let _ = create_table(&client, "loans", "loan_id", "user_id", "loan_date").await;
            let _ = create_table(&client, "books", "book_id", "author", "title").await;
            Box::new(DDBLoanRepository::new(client, "loans", "loans_ndx", "books"))
        }
        RepositoryStore::Memory => {
            Box::new(MemoryLoanRepository::new(MemoryDatabase::shared()))
        }
    }
}

pub(crate) async fn create_loan_service(config: &Configuration, store: RepositoryStore) -> Box<dyn LoanService> {
    let loan_repo = factory::create_loan_repository(store).await;
    let book_repo = create_book_repository(store).await;
    let user_repo = create_user_repository(store).await;
    Box::new(LoanServiceImpl::new(config, loan_repo, book_repo, user_repo, Box::new(SystemClock)))
}
