use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::post,
    Router,
};
use serde_json::Value;
use crate::auth::command::login_cmd::{LoginCommand, LoginCommandRequest, LoginCommandResponse};
use crate::auth::command::login_external_cmd::{LoginExternalCommand, LoginExternalCommandRequest, LoginExternalCommandResponse};
use crate::auth::command::logout_cmd::{LogoutCommand, LogoutCommandRequest, LogoutCommandResponse};
use crate::auth::command::refresh_cmd::{RefreshCommand, RefreshCommandRequest, RefreshCommandResponse};
use crate::auth::domain::AuthService;
use crate::auth::factory;
use crate::core::command::Command;
use crate::core::controller::{AppState, json_to_server_error, ServerError};

// header carrying the identity gateway's shared key
const GATEWAY_KEY_HEADER: &str = "x-gateway-key";

async fn build_service(state: AppState) -> Box<dyn AuthService> {
    factory::create_auth_service(&state.config, state.store).await
}

// Token routes; registration lives with the user routes.
pub fn auth_routes() -> Router<AppState, lambda_http::Body> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/external", post(login_external))
}

pub(crate) async fn login(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<LoginCommandResponse>, ServerError> {
    let req: LoginCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let svc = build_service(state).await;
    let res = LoginCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn refresh(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<RefreshCommandResponse>, ServerError> {
    let req: RefreshCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let svc = build_service(state).await;
    let res = RefreshCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn logout(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<LogoutCommandResponse>, ServerError> {
    let req: LogoutCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let svc = build_service(state).await;
    let res = LogoutCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub(crate) async fn login_external(
    State(state): State<AppState>,
    headers: HeaderMap,
    json: Json<Value>) -> Result<Json<LoginExternalCommandResponse>, ServerError> {
    let mut req: LoginExternalCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    req.gateway_key = headers.get(GATEWAY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let gateway_key = state.config.external_auth_key.clone();
    let svc = build_service(state).await;
    let res = LoginExternalCommand::new(svc, gateway_key).execute(req).await?;
    Ok(Json(res))
}
