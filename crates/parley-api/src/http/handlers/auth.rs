//! Account HTTP handlers.
//!
//! Endpoints:
//! - POST /api/auth/register - Create an account
//! - POST /api/auth/login    - Exchange email/password for credentials
//! - POST /api/auth/refresh  - Exchange the refresh cookie for an access credential
//! - GET  /api/auth/users/me - The authenticated user

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parley_types::credential::IssuedCredential;
use parley_types::user::User;

use crate::http::error::AppError;
use crate::http::extractors::auth::{CurrentUser, refresh_cookie, refresh_cookie_header};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub fullname: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// An access credential returned in a response body.
#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedCredential> for AccessTokenResponse {
    fn from(credential: IssuedCredential) -> Self {
        Self {
            access_token: credential.token,
            token_type: "bearer",
            expires_at: credential.expires_at,
        }
    }
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let user = state
        .accounts
        .register(&req.email, &req.password, req.fullname)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(user, request_id, elapsed).with_link("me", "/api/auth/users/me")),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let pair = state.accounts.login(&req.email, &req.password).await?;
    let cookie = refresh_cookie_header(
        &pair.refresh.token,
        state.accounts.tokens().refresh_ttl().num_seconds(),
    );

    let elapsed = start.elapsed().as_millis() as u64;
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(
            ApiResponse::success(AccessTokenResponse::from(pair.access), request_id, elapsed)
                .with_link("me", "/api/auth/users/me")
                .with_link("refresh", "/api/auth/refresh"),
        ),
    ))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<AccessTokenResponse>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let token = refresh_cookie(&headers)
        .ok_or_else(|| AppError::Unauthorized("Missing refresh credential".to_string()))?;
    let access = state.accounts.refresh(&token).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        AccessTokenResponse::from(access),
        request_id,
        elapsed,
    )))
}

/// GET /api/auth/users/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<ApiResponse<User>> {
    let request_id = uuid::Uuid::now_v7().to_string();
    Json(ApiResponse::success(user, request_id, 0).with_link("self", "/api/auth/users/me"))
}
