//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::header::{RETRY_AFTER, WWW_AUTHENTICATE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use parley_types::error::{AuthError, ChatError, RepositoryError};
use parley_types::llm::CompletionError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Account and credential errors.
    Auth(AuthError),
    /// Chat orchestration errors.
    Chat(ChatError),
    /// Missing or unreadable credential on the request itself.
    Unauthorized(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Status, machine code and client-facing message for a storage failure.
/// Details of server-side faults only go to the log.
fn repository_parts(e: &RepositoryError) -> (StatusCode, &'static str, String) {
    match e {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string()),
        RepositoryError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT", e.to_string()),
        RepositoryError::InternalConsistency(_) | RepositoryError::Storage(_) => {
            tracing::error!(error = %e, "storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Auth(AuthError::Conflict(email)) => (
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                format!("Email '{email}' is already registered"),
            ),
            AppError::Auth(e @ AuthError::InvalidCredential(_)) => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIAL", e.to_string())
            }
            AppError::Auth(e @ AuthError::ExpiredCredential) => {
                (StatusCode::UNAUTHORIZED, "CREDENTIAL_EXPIRED", e.to_string())
            }
            AppError::Auth(AuthError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Auth(AuthError::Storage(e)) => repository_parts(e),
            AppError::Auth(e @ (AuthError::Hashing(_) | AuthError::Signing(_))) => {
                tracing::error!(error = %e, "credential processing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
            AppError::Chat(ChatError::NotFound) => {
                (StatusCode::NOT_FOUND, "CHAT_NOT_FOUND", "Chat not found".to_string())
            }
            AppError::Chat(ChatError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Chat(ChatError::TransientUpstream(CompletionError::RateLimited { .. })) => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Completion API rate limit exceeded".to_string(),
            ),
            AppError::Chat(ChatError::TransientUpstream(e)) => {
                tracing::warn!(error = %e, "completion upstream failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_UNAVAILABLE",
                    "Completion API is unavailable".to_string(),
                )
            }
            AppError::Chat(ChatError::Storage(e)) => repository_parts(e),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let request_id = uuid::Uuid::now_v7().to_string();

        let mut response = (
            status,
            Json(ApiResponse::error(code, &message, request_id, 0)),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        if let AppError::Chat(ChatError::TransientUpstream(CompletionError::RateLimited {
            retry_after_ms: Some(ms),
        })) = &self
        {
            let secs = ms.div_ceil(1000).max(1);
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: AppError) -> StatusCode {
        e.into_response().status()
    }

    #[test]
    fn test_auth_errors_map_to_status() {
        assert_eq!(
            status_of(AuthError::Conflict("a@b.c".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AuthError::InvalidCredential("x".into()).into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AuthError::ExpiredCredential.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AuthError::Validation("short".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AuthError::Hashing("boom".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_chat_errors_map_to_status() {
        assert_eq!(status_of(ChatError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ChatError::TransientUpstream(CompletionError::Timeout(100)).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(
                ChatError::Storage(RepositoryError::InternalConsistency("dup".into())).into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_carries_bearer_challenge() {
        let response = AppError::Unauthorized("missing".into()).into_response();
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn test_rate_limited_carries_retry_after() {
        let response = AppError::from(ChatError::TransientUpstream(
            CompletionError::RateLimited {
                retry_after_ms: Some(2500),
            },
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "3");
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let (_, _, message) =
            AppError::from(ChatError::Storage(RepositoryError::Storage("disk I/O error".into())))
                .parts();
        assert_eq!(message, INTERNAL_MESSAGE);
    }
}
