use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::auth::domain::Principal;
use crate::core::command::{Command, CommandError};
use crate::loans::domain::LoanService;
use crate::loans::dto::LoanDto;
use crate::utils::date::opt_serializer;

pub(crate) struct CreateLoanCommand {
    loan_service: Box<dyn LoanService>,
}

impl CreateLoanCommand {
    pub(crate) fn new(loan_service: Box<dyn LoanService>) -> Self {
        Self {
            loan_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateLoanCommandRequest {
    // defaults to the requester
    #[serde(default)]
    pub user_id: Option<String>,
    pub book_id: String,
    #[serde(default, with = "opt_serializer")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(skip, default)]
    pub requester: Principal,
}

impl CreateLoanCommandRequest {
    pub fn new(book_id: &str, requester: Principal) -> Self {
        Self {
            user_id: None,
            book_id: book_id.to_string(),
            due_date: None,
            requester,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateLoanCommandResponse {
    pub loan: LoanDto,
}

impl CreateLoanCommandResponse {
    pub fn new(loan: LoanDto) -> Self {
        Self {
            loan,
        }
    }
}

#[async_trait]
impl Command<CreateLoanCommandRequest, CreateLoanCommandResponse> for CreateLoanCommand {
    async fn execute(&self, req: CreateLoanCommandRequest) -> Result<CreateLoanCommandResponse, CommandError> {
        let user_id = req.user_id.unwrap_or_else(|| req.requester.user_id.to_string());
        if !req.requester.can_access(user_id.as_str()) {
            return Err(CommandError::forbidden("only admins may lend books to other users"));
        }
        self.loan_service.create_loan(user_id.as_str(), req.book_id.as_str(), req.due_date)
            .await.map_err(CommandError::from).map(CreateLoanCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use lazy_static::lazy_static;
    use crate::auth::domain::Principal;
    use crate::books::domain::model::BookEntity;
    use crate::books::factory::create_book_repository;
    use crate::core::clock::{Clock, SystemClock};
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::library::{LoanStatus, Role};
    use crate::core::repository::{Repository, RepositoryStore};
    use crate::loans::command::create_loan_cmd::{CreateLoanCommand, CreateLoanCommandRequest};
    use crate::loans::factory::create_loan_service;
    use crate::users::domain::model::UserEntity;
    use crate::users::factory::create_user_repository;

    lazy_static! {
        static ref SUT : AsyncOnce<CreateLoanCommand> = AsyncOnce::new(async {
                let svc = create_loan_service(&Configuration::new("test"), RepositoryStore::Memory).await;
                CreateLoanCommand::new(svc)
            });
    }

    async fn add_user_and_book(name: &str) -> (Principal, BookEntity) {
        let now = SystemClock.now();
        let user = UserEntity::new(name, format!("{}@create-loan.test", name).as_str(), "hash", Role::User, now);
        create_user_repository(RepositoryStore::Memory).await.create(&user).await.expect("should add user");
        let book = BookEntity::new("Dune", "Frank Herbert", now);
        create_book_repository(RepositoryStore::Memory).await.create(&book).await.expect("should add book");
        (Principal::new(user.user_id.as_str(), Role::User), book)
    }

    #[tokio::test]
    async fn test_should_run_create_loan() {
        let sut: &CreateLoanCommand = SUT.get().await;
        let (ana, book) = add_user_and_book("ana").await;
        let res = sut.execute(CreateLoanCommandRequest::new(book.book_id.as_str(), ana.clone()))
            .await.expect("should create loan");
        assert_eq!(ana.user_id, res.loan.user_id);
        assert_eq!(LoanStatus::Active, res.loan.loan_status);
    }

    #[tokio::test]
    async fn test_should_not_lend_for_someone_else() {
        let sut: &CreateLoanCommand = SUT.get().await;
        let (bob, book) = add_user_and_book("bob").await;
        let mut req = CreateLoanCommandRequest::new(book.book_id.as_str(), Principal::new("mallory", Role::User));
        req.user_id = Some(bob.user_id.to_string());
        assert!(matches!(sut.execute(req).await, Err(CommandError::Forbidden { .. })));
    }
}
