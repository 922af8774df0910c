use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::Value;
use crate::auth::extractor::AuthenticatedUser;
use crate::catalog::command::add_book_cmd::{AddBookCommand, AddBookCommandRequest, AddBookCommandResponse};
use crate::catalog::command::book_availability_cmd::{BookAvailabilityCommand, BookAvailabilityCommandRequest, BookAvailabilityCommandResponse};
use crate::catalog::command::get_book_cmd::{GetBookCommand, GetBookCommandRequest, GetBookCommandResponse};
use crate::catalog::command::query_books_cmd::{QueryBooksCommand, QueryBooksCommandRequest, QueryBooksCommandResponse};
use crate::catalog::command::remove_book_cmd::{RemoveBookCommand, RemoveBookCommandRequest, RemoveBookCommandResponse};
use crate::catalog::command::update_book_cmd::{UpdateBookCommand, UpdateBookCommandRequest, UpdateBookCommandResponse};
use crate::catalog::domain::CatalogService;
use crate::catalog::factory;
use crate::core::command::Command;
use crate::core::controller::{AppState, json_to_server_error, ServerError};

async fn build_service(state: AppState) -> Box<dyn CatalogService> {
    factory::create_catalog_service(&state.config, state.store).await
}

// Reads are public; writes need an admin token.
pub fn catalog_routes() -> Router<AppState, lambda_http::Body> {
    Router::new()
        .route("/books", get(query_books).post(add_book))
        .route("/books/:id", get(find_book_by_id).put(update_book).delete(remove_book))
        .route("/books/:id/availability", get(check_availability))
}

pub(crate) async fn add_book(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    json: Json<Value>) -> Result<Json<AddBookCommandResponse>, ServerError> {
    let mut req: AddBookCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    req.requester = requester;
    let svc = build_service(state).await;
    let res = AddBookCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn find_book_by_id(
    State(state): State<AppState>,
    Path(book_id): Path<String>) -> Result<Json<GetBookCommandResponse>, ServerError> {
    let req = GetBookCommandRequest { book_id };
    let svc = build_service(state).await;
    let res = GetBookCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn query_books(
    State(state): State<AppState>,
    Query(req): Query<QueryBooksCommandRequest>) -> Result<Json<QueryBooksCommandResponse>, ServerError> {
    let svc = build_service(state).await;
    let res = QueryBooksCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn update_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    AuthenticatedUser(requester): AuthenticatedUser,
    json: Json<Value>) -> Result<Json<UpdateBookCommandResponse>, ServerError> {
    let mut req: UpdateBookCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    req.book_id = book_id;
    req.requester = requester;
    let svc = build_service(state).await;
    let res = UpdateBookCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn remove_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    AuthenticatedUser(requester): AuthenticatedUser) -> Result<Json<RemoveBookCommandResponse>, ServerError> {
    let req = RemoveBookCommandRequest { book_id, requester };
    let svc = build_service(state).await;
    let res = RemoveBookCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn check_availability(
    State(state): State<AppState>,
    Path(book_id): Path<String>) -> Result<Json<BookAvailabilityCommandResponse>, ServerError> {
    let req = BookAvailabilityCommandRequest { book_id };
    let svc = build_service(state).await;
    let res = BookAvailabilityCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}
