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
use crate::users::command::add_user_cmd::{AddUserCommand, AddUserCommandRequest, AddUserCommandResponse};
use crate::users::command::get_user_cmd::{GetUserCommand, GetUserCommandRequest, GetUserCommandResponse};
use crate::users::command::query_users_cmd::{QueryUsersCommand, QueryUsersCommandRequest, QueryUsersCommandResponse};
use crate::users::command::register_user_cmd::{RegisterUserCommand, RegisterUserCommandRequest, RegisterUserCommandResponse};
use crate::users::command::remove_user_cmd::{RemoveUserCommand, RemoveUserCommandRequest, RemoveUserCommandResponse};
use crate::users::command::update_user_cmd::{UpdateUserCommand, UpdateUserCommandRequest, UpdateUserCommandResponse};
use crate::users::domain::UserService;
use crate::users::factory;

async fn build_service(state: AppState) -> Box<dyn UserService> {
    factory::create_user_service(&state.config, state.store).await
}

pub fn user_routes() -> Router<AppState, lambda_http::Body> {
    Router::new()
        .route("/auth/register", post(register_user))
        .route("/users", get(query_users).post(add_user))
        .route("/users/me", get(current_user))
        .route("/users/:id", get(find_user_by_id).put(update_user).delete(remove_user))
}

pub(crate) async fn register_user(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<RegisterUserCommandResponse>, ServerError> {
    let req: RegisterUserCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let svc = build_service(state).await;
    let res = RegisterUserCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn add_user(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    json: Json<Value>) -> Result<Json<AddUserCommandResponse>, ServerError> {
    let mut req: AddUserCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    req.requester = requester;
    let svc = build_service(state).await;
    let res = AddUserCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn current_user(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser) -> Result<Json<GetUserCommandResponse>, ServerError> {
    let req = GetUserCommandRequest { user_id: requester.user_id.to_string(), requester };
    let svc = build_service(state).await;
    let res = GetUserCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn find_user_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AuthenticatedUser(requester): AuthenticatedUser) -> Result<Json<GetUserCommandResponse>, ServerError> {
    let req = GetUserCommandRequest { user_id, requester };
    let svc = build_service(state).await;
    let res = GetUserCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn query_users(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Query(mut req): Query<QueryUsersCommandRequest>) -> Result<Json<QueryUsersCommandResponse>, ServerError> {
    req.requester = requester;
    let svc = build_service(state).await;
    let res = QueryUsersCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AuthenticatedUser(requester): AuthenticatedUser,
    json: Json<Value>) -> Result<Json<UpdateUserCommandResponse>, ServerError> {
    let mut req: UpdateUserCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    req.user_id = user_id;
    req.requester = requester;
    let svc = build_service(state).await;
    let res = UpdateUserCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn remove_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AuthenticatedUser(requester): AuthenticatedUser) -> Result<Json<RemoveUserCommandResponse>, ServerError> {
    let req = RemoveUserCommandRequest { user_id, requester };
    let svc = build_service(state).await;
    let res = RemoveUserCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}
