use crate::core::clock::SystemClock;
use crate::core::domain::Configuration;
use crate::core::repository::RepositoryStore;
use crate::loans::factory::create_loan_repository;
use crate::users::domain::UserService;
use crate::users::domain::service::UserServiceImpl;
use crate::users::factory;
use crate::users::repository::UserRepository;
use crate::users::repository::ddb_user_repository::DDBUserRepository;
use crate::users::repository::memory_user_repository::MemoryUserRepository;
use crate::utils::ddb::{build_db_client, create_table};
use crate::utils::memory::MemoryDatabase;

pub(crate) async fn create_user_repository(store: RepositoryStore) -> Box<dyn UserRepository> {
    match store {
        RepositoryStore::DynamoDB => {
            let client = build_db_client(store).await;
            Box::new(DDBUserRepository::new(client, "users", "users_ndx"))
        }
        RepositoryStore::LocalDynamoDB => {
            let client = build_db_client(store).await;
            let _ = create_table(&client, "users", "user_id", "email", "username").await;
            Box::new(DDBUserRepository::new(client, "users", "users_ndx"))
        }
        RepositoryStore::Memory => {
            Box::new(MemoryUserRepository::new(MemoryDatabase::shared()))
        }
    }
}

pub(crate) async fn create_user_service(config: &Configuration, store: RepositoryStore) -> Box<dyn UserService> {
    let user_repo = factory::create_user_repository(store).await;
    let loan_repo = create_loan_repository(store).await;
    Box::new(UserServiceImpl::new(config, user_repo, loan_repo, Box::new(SystemClock)))
}
