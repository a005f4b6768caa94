//! # Session Gate
//!
//! Resolves the caller from a signed session token. The token travels either
//! as `Authorization: Bearer <token>` (API clients) or in the
//! `session_token` cookie (the browser).

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use rh_core::error::AppError;
use rh_core::models::User;
use tracing::debug;

use crate::error::ApiError;
use crate::handlers::AppState;

pub const SESSION_COOKIE: &str = "session_token";

/// A signed-in caller. Rejects with 401 when no identity resolves.
///
/// The user row is upserted on every gated request so content never
/// references a user the store has not seen.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let identity = session_token(&parts.headers)
            .and_then(|token| state.sessions.resolve(token))
            .ok_or(AppError::Unauthorized)?;

        let user = state.repo.upsert_user(&identity).await?;
        debug!(user_id = %user.id, "session resolved");
        Ok(CurrentUser(user))
    }
}

/// Bearer header first, then the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
        })
}
