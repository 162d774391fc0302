use thiserror::Error;

use crate::llm::CompletionError;

/// Errors from repository and unit-of-work operations (used by the port
/// traits in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("entity not found")]
    NotFound,

    /// A lookup by unique key returned more than one row.
    #[error("internal consistency violation: {0}")]
    InternalConsistency(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors related to registration, login and credential handling.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email '{0}' is already registered")]
    Conflict(String),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("credential has expired")]
    ExpiredCredential,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("credential signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// Errors related to chat orchestration.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat not found")]
    NotFound,

    #[error("invalid input: {0}")]
    Validation(String),

    /// The completion provider was rate-limited, unreachable or timed out.
    #[error("completion upstream failed: {0}")]
    TransientUpstream(#[from] CompletionError),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}
