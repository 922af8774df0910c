use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::Principal;
use crate::core::command::{Command, CommandError, page_size};
use crate::core::library::{LoanStatus, PaginatedResult};
use crate::loans::domain::LoanService;
use crate::loans::dto::{LoanDto, LoanFilter};

pub(crate) struct ListLoansCommand {
    loan_service: Box<dyn LoanService>,
}

impl ListLoansCommand {
    pub(crate) fn new(loan_service: Box<dyn LoanService>) -> Self {
        Self {
            loan_service,
        }
    }
}

// Built from the query string, e.g. `?status=overdue&page_size=10`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListLoansCommandRequest {
    pub user_id: Option<String>,
    pub book_id: Option<String>,
    pub status: Option<LoanStatus>,
    pub page: Option<String>,
    pub page_size: Option<usize>,
    #[serde(skip, default)]
    pub requester: Principal,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListLoansCommandResponse {
    pub loans: PaginatedResult<LoanDto>,
}

impl ListLoansCommandResponse {
    pub fn new(loans: PaginatedResult<LoanDto>) -> Self {
        Self {
            loans,
        }
    }
}

#[async_trait]
impl Command<ListLoansCommandRequest, ListLoansCommandResponse> for ListLoansCommand {
    async fn execute(&self, req: ListLoansCommandRequest) -> Result<ListLoansCommandResponse, CommandError> {
        let filter = LoanFilter {
            user_id: req.user_id,
            book_id: req.book_id,
            status: req.status,
        };
        self.loan_service.list_loans(&req.requester, &filter, req.page.as_deref(), page_size(req.page_size))
            .await.map_err(CommandError::from).map(ListLoansCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use lazy_static::lazy_static;
    use crate::auth::domain::Principal;
    use crate::core::command::Command;
    use crate::core::domain::Configuration;
    use crate::core::library::Role;
    use crate::core::repository::RepositoryStore;
    use crate::loans::command::list_loans_cmd::{ListLoansCommand, ListLoansCommandRequest};
    use crate::loans::factory::create_loan_service;

    lazy_static! {
        static ref SUT : AsyncOnce<ListLoansCommand> = AsyncOnce::new(async {
                let svc = create_loan_service(&Configuration::new("test"), RepositoryStore::Memory).await;
                ListLoansCommand::new(svc)
            });
    }

    #[tokio::test]
    async fn test_should_run_list_loans() {
        let sut: &ListLoansCommand = SUT.get().await;
        let req = ListLoansCommandRequest {
            requester: Principal::new("user-without-loans", Role::User),
            ..ListLoansCommandRequest::default()
        };
        let res = sut.execute(req).await.expect("should list loans");
        assert!(res.loans.records.is_empty());
        assert_eq!(20, res.loans.page_size);
    }
}
