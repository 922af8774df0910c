use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::Principal;
use crate::core::command::{Command, CommandError, page_size};
use crate::core::library::PaginatedResult;
use crate::loans::domain::LoanService;
use crate::loans::dto::LoanDto;

pub(crate) struct OverdueLoansCommand {
    loan_service: Box<dyn LoanService>,
}

impl OverdueLoansCommand {
    pub(crate) fn new(loan_service: Box<dyn LoanService>) -> Self {
        Self {
            loan_service,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OverdueLoansCommandRequest {
    pub page: Option<String>,
    pub page_size: Option<usize>,
    #[serde(skip, default)]
    pub requester: Principal,
}

#[derive(Debug, Serialize)]
pub(crate) struct OverdueLoansCommandResponse {
    pub loans: PaginatedResult<LoanDto>,
}

impl OverdueLoansCommandResponse {
    pub fn new(loans: PaginatedResult<LoanDto>) -> Self {
        Self {
            loans,
        }
    }
}

#[async_trait]
impl Command<OverdueLoansCommandRequest, OverdueLoansCommandResponse> for OverdueLoansCommand {
    async fn execute(&self, req: OverdueLoansCommandRequest) -> Result<OverdueLoansCommandResponse, CommandError> {
        if !req.requester.is_admin() {
            return Err(CommandError::forbidden("only admins may list overdue loans"));
        }
        self.loan_service.query_overdue(req.page.as_deref(), page_size(req.page_size))
            .await.map_err(CommandError::from).map(OverdueLoansCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use lazy_static::lazy_static;
    use crate::auth::domain::Principal;
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::library::Role;
    use crate::core::repository::RepositoryStore;
    use crate::loans::command::overdue_loans_cmd::{OverdueLoansCommand, OverdueLoansCommandRequest};
    use crate::loans::factory::create_loan_service;

    lazy_static! {
        static ref SUT : AsyncOnce<OverdueLoansCommand> = AsyncOnce::new(async {
                let svc = create_loan_service(&Configuration::new("test"), RepositoryStore::Memory).await;
                OverdueLoansCommand::new(svc)
            });
    }

    #[tokio::test]
    async fn test_should_restrict_overdue_to_admins() {
        let sut: &OverdueLoansCommand = SUT.get().await;
        let req = OverdueLoansCommandRequest { requester: Principal::new("u1", Role::User), ..OverdueLoansCommandRequest::default() };
        assert!(matches!(sut.execute(req).await, Err(CommandError::Forbidden { .. })));

        let req = OverdueLoansCommandRequest { requester: Principal::new("admin", Role::Admin), ..OverdueLoansCommandRequest::default() };
        assert!(sut.execute(req).await.is_ok());
    }
}
