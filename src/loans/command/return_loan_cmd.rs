use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::domain::Principal;
use crate::core::command::{Command, CommandError};
use crate::loans::domain::LoanService;
use crate::loans::dto::LoanDto;

pub(crate) struct ReturnLoanCommand {
    loan_service: Box<dyn LoanService>,
}

impl ReturnLoanCommand {
    pub(crate) fn new(loan_service: Box<dyn LoanService>) -> Self {
        Self {
            loan_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReturnLoanCommandRequest {
    pub loan_id: String,
    #[serde(skip, default)]
    pub requester: Principal,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReturnLoanCommandResponse {
    pub loan: LoanDto,
}

impl ReturnLoanCommandResponse {
    pub fn new(loan: LoanDto) -> Self {
        Self {
            loan,
        }
    }
}

#[async_trait]
impl Command<ReturnLoanCommandRequest, ReturnLoanCommandResponse> for ReturnLoanCommand {
    async fn execute(&self, req: ReturnLoanCommandRequest) -> Result<ReturnLoanCommandResponse, CommandError> {
        self.loan_service.return_loan(req.loan_id.as_str(), &req.requester)
            .await.map_err(CommandError::from).map(ReturnLoanCommandResponse::new)
    }
}
