//! Bearer credential extractor and refresh-cookie helpers.
//!
//! Access credentials travel in `Authorization: Bearer <token>`. The refresh
//! credential lives in an HTTP-only cookie scoped to `/api/auth`.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

use parley_types::user::User;

use crate::http::error::AppError;
use crate::state::AppState;

/// Cookie holding the refresh credential.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Path the refresh cookie is scoped to.
const REFRESH_COOKIE_PATH: &str = "/api/auth";

/// The user behind a valid access credential. Extracting this authenticates
/// the request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user = state.accounts.me(token).await?;
        Ok(CurrentUser(user))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer credential".to_string()))?;
    let value = header.to_str().map_err(|_| {
        AppError::Unauthorized("Invalid Authorization header encoding".to_string())
    })?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AppError::Unauthorized(
            "Expected 'Authorization: Bearer <token>'".to_string(),
        )),
    }
}

/// The refresh credential from the request cookies, if present.
pub fn refresh_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == REFRESH_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a refresh credential.
pub fn refresh_cookie_header(token: &str, max_age_secs: i64) -> String {
    format!(
        "{REFRESH_COOKIE}={token}; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}; Path={REFRESH_COOKIE_PATH}"
    )
}
