use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use crate::auth::extractor::AuthenticatedUser;
use crate::core::command::Command;
use crate::core::controller::{AppState, json_to_server_error, ServerError};
use crate::loans::command::create_loan_cmd::{CreateLoanCommand, CreateLoanCommandRequest, CreateLoanCommandResponse};
use crate::loans::command::get_loan_cmd::{GetLoanCommand, GetLoanCommandRequest, GetLoanCommandResponse};
use crate::loans::command::list_loans_cmd::{ListLoansCommand, ListLoansCommandRequest, ListLoansCommandResponse};
use crate::loans::command::overdue_loans_cmd::{OverdueLoansCommand, OverdueLoansCommandRequest, OverdueLoansCommandResponse};
use crate::loans::command::return_loan_cmd::{ReturnLoanCommand, ReturnLoanCommandRequest, ReturnLoanCommandResponse};
use crate::loans::domain::LoanService;
use crate::loans::factory;

async fn build_service(state: AppState) -> Box<dyn LoanService> {
    factory::create_loan_service(&state.config, state.store).await
}

// Routes of the loans function.
pub fn loan_routes() -> Router<AppState, lambda_http::Body> {
    Router::new()
        .route("/loans", get(list_loans).post(create_loan))
        .route("/loans/overdue", get(overdue_loans))
        .route("/loans/:id", get(get_loan))
        .route("/loans/:id/return", post(return_loan))
        .route("/users/me/loans", get(my_loans))
}

pub(crate) async fn create_loan(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    json: Json<Value>) -> Result<Json<CreateLoanCommandResponse>, ServerError> {
    let mut req: CreateLoanCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    req.requester = requester;
    let svc = build_service(state).await;
    let res = CreateLoanCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn return_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<String>,
    AuthenticatedUser(requester): AuthenticatedUser) -> Result<Json<ReturnLoanCommandResponse>, ServerError> {
    let req = ReturnLoanCommandRequest { loan_id, requester };
    let svc = build_service(state).await;
    let res = ReturnLoanCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn get_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<String>,
    AuthenticatedUser(requester): AuthenticatedUser) -> Result<Json<GetLoanCommandResponse>, ServerError> {
    let req = GetLoanCommandRequest { loan_id, requester };
    let svc = build_service(state).await;
    let res = GetLoanCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn list_loans(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Query(mut req): Query<ListLoansCommandRequest>) -> Result<Json<ListLoansCommandResponse>, ServerError> {
    req.requester = requester;
    let svc = build_service(state).await;
    let res = ListLoansCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn my_loans(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Query(mut req): Query<ListLoansCommandRequest>) -> Result<Json<ListLoansCommandResponse>, ServerError> {
    req.user_id = Some(requester.user_id.to_string());
    req.requester = requester;
    let svc = build_service(state).await;
    let res = ListLoansCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn overdue_loans(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Query(mut req): Query<OverdueLoansCommandRequest>) -> Result<Json<OverdueLoansCommandResponse>, ServerError> {
    req.requester = requester;
    let svc = build_service(state).await;
    let res = OverdueLoansCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}
