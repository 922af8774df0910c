pub mod create_loan_cmd;
pub mod get_loan_cmd;
pub mod list_loans_cmd;
pub mod overdue_loans_cmd;
pub mod return_loan_cmd;
