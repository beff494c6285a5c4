use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::token::TokenKeys;
use crate::error::AppError;
use crate::state::AppState;

/// Extracts and validates the bearer token, returning the user ID.
pub struct AuthUser(pub Uuid);

/// Like [`AuthUser`], but a missing or invalid token yields `None` instead of a rejection.
pub struct MaybeAuthUser(pub Option<Uuid>);

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::MissingToken)?;

    // Expect "Bearer <token>", scheme case-insensitive
    let (scheme, token) = header.split_once(' ').ok_or(AppError::MissingToken)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AppError::MissingToken);
    }
    Ok(token)
}

fn user_from_parts(parts: &Parts, state: &AppState) -> Result<Uuid, AppError> {
    let token = bearer_token(parts)?;
    let keys = TokenKeys::from_ref(state);
    let user_id = keys.parse(token)?;
    Uuid::parse_str(&user_id).map_err(|_| AppError::InvalidToken)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match user_from_parts(parts, state) {
            Ok(user_id) => Ok(AuthUser(user_id)),
            Err(e) => {
                warn!(error = %e, "request not authenticated");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match user_from_parts(parts, state) {
            Ok(user_id) => Ok(MaybeAuthUser(Some(user_id))),
            Err(AppError::MissingToken) => Ok(MaybeAuthUser(None)),
            Err(e) => {
                debug!(error = %e, "ignoring invalid token on public route");
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
