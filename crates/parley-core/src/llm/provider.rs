//! CompletionProvider trait definition.
//!
//! The chat orchestration talks to the language model only through this
//! port. Implementations live in parley-infra (e.g.
//! `OpenAiCompatibleProvider`). Retry and backoff are the caller's concern
//! and are not performed here.

use parley_types::llm::{ChatTurn, CompletionError};

/// A chat completion backend.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait CompletionProvider: Send + Sync {
    /// Given the ordered conversation so far (oldest first, last entry is the
    /// new user turn), return the assistant's reply text.
    fn complete(
        &self,
        history: &[ChatTurn],
    ) -> impl std::future::Future<Output = Result<String, CompletionError>> + Send;
}
