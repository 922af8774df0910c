use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum::http::{header::AUTHORIZATION, StatusCode};
use crate::auth::domain::{AuthService, Principal};
use crate::auth::factory::create_auth_service;
use crate::core::command::CommandError;
use crate::core::controller::{AppState, ServerError};

// AuthenticatedUser resolves the bearer access token of a request to its principal.
// Role checks beyond "signed in" are left to the commands.
pub(crate) struct AuthenticatedUser(pub Principal);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return None;
    }
    Some(token.trim())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| (StatusCode::UNAUTHORIZED, "missing bearer token".to_string()))?;
        let svc = create_auth_service(&state.config, state.store).await;
        let principal = svc.authorize(token, &[]).await.map_err(CommandError::from)?;
        Ok(AuthenticatedUser(principal))
    }
}
