//! Chat orchestration.
//!
//! ChatService composes one completion call with the repository writes that
//! record it. The completion call always happens outside any unit of work:
//! reads that feed it run in a unit that is rolled back first, and the writes
//! that record its result run in a fresh unit committed as one.

use std::time::Duration;

use tracing::Span;

use parley_types::chat::{Chat, ChatPatch, Exchange, Message, NewChat, NewMessage};
use parley_types::error::{ChatError, RepositoryError};
use parley_types::llm::{ChatTurn, CompletionError};

use crate::llm::provider::CompletionProvider;
use crate::repository::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::repository::{ChatFilter, MessageFilter, Repository};

use super::title::{MAX_TITLE_LEN, bound_title, derive_title};

/// Default bound on one completion call.
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of most recent messages sent as context.
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Service orchestrating chats, their messages and the completion provider.
pub struct ChatService<F: UnitOfWorkFactory, P: CompletionProvider> {
    uow: F,
    completion: P,
    completion_timeout: Duration,
    history_limit: u32,
    span: Span,
}

impl<F: UnitOfWorkFactory, P: CompletionProvider> ChatService<F, P> {
    pub fn new(uow: F, completion: P, span: Span) -> Self {
        Self {
            uow,
            completion,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            history_limit: DEFAULT_HISTORY_LIMIT,
            span,
        }
    }

    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Start a new chat from its first user message.
    ///
    /// 1. Ask the completion provider for a reply (no transaction open).
    /// 2. In one unit: insert the chat (titled from the reply), the user
    ///    message, then the assistant message; commit.
    ///
    /// A failed completion writes nothing. A failed write rolls back the
    /// whole unit and the reply is discarded.
    #[tracing::instrument(
        name = "create_chat_with_first_message",
        parent = &self.span,
        skip_all,
        fields(owner_id = owner_id)
    )]
    pub async fn create_chat_with_first_message(
        &self,
        owner_id: i64,
        content: &str,
    ) -> Result<Exchange, ChatError> {
        let content = validate_content(content)?;

        let reply = self.complete(&[ChatTurn::user(content)]).await?;
        let title = derive_title(&reply);

        let mut uow = self.uow.begin().await?;
        let chat = uow.chats().add(&NewChat { title, owner_id }).await?;
        let user_message = uow
            .messages()
            .add(&NewMessage::from_user(chat.id, owner_id, content))
            .await?;
        let assistant_message = uow
            .messages()
            .add(&NewMessage::from_assistant(chat.id, reply))
            .await?;
        uow.commit().await?;

        tracing::info!(chat_id = chat.id, "chat created with first exchange");

        Ok(Exchange {
            chat,
            user_message,
            assistant_message,
        })
    }

    /// Append a user message to an owned chat and record the reply.
    ///
    /// Ownership is checked before the completion call and again inside the
    /// writing unit, so a chat deleted in between yields `NotFound` rather
    /// than orphaned messages.
    #[tracing::instrument(
        name = "append_message",
        parent = &self.span,
        skip_all,
        fields(chat_id = chat_id, owner_id = owner_id)
    )]
    pub async fn append_message(
        &self,
        chat_id: i64,
        owner_id: i64,
        content: &str,
    ) -> Result<Exchange, ChatError> {
        let content = validate_content(content)?;

        let history = {
            let mut uow = self.uow.begin().await?;
            owned_chat(&mut uow, chat_id, owner_id).await?;
            let history = uow
                .messages()
                .get_all(&MessageFilter::latest_in_chat(chat_id, self.history_limit))
                .await?;
            uow.rollback().await?;
            history
        };

        let mut turns: Vec<ChatTurn> = history.iter().map(ChatTurn::from).collect();
        turns.push(ChatTurn::user(content));
        let reply = self.complete(&turns).await?;

        let mut uow = self.uow.begin().await?;
        let chat = owned_chat(&mut uow, chat_id, owner_id).await?;
        let user_message = uow
            .messages()
            .add(&NewMessage::from_user(chat.id, owner_id, content))
            .await?;
        let assistant_message = uow
            .messages()
            .add(&NewMessage::from_assistant(chat.id, reply))
            .await?;
        uow.commit().await?;

        tracing::info!(history_len = history.len(), "message appended");

        Ok(Exchange {
            chat,
            user_message,
            assistant_message,
        })
    }

    /// All chats owned by `owner_id`, oldest first. No chats is an empty list.
    pub async fn list_chats(&self, owner_id: i64) -> Result<Vec<Chat>, ChatError> {
        let mut uow = self.uow.begin().await?;
        let chats = uow.chats().get_all(&ChatFilter::owned_by(owner_id)).await?;
        uow.rollback().await?;
        Ok(chats)
    }

    /// Every message of an owned chat in insertion order.
    pub async fn chat_messages(
        &self,
        chat_id: i64,
        owner_id: i64,
    ) -> Result<Vec<Message>, ChatError> {
        let mut uow = self.uow.begin().await?;
        owned_chat(&mut uow, chat_id, owner_id).await?;
        let messages = uow.messages().get_all(&MessageFilter::in_chat(chat_id)).await?;
        uow.rollback().await?;
        Ok(messages)
    }

    /// Rename an owned chat. The title is bounded like a derived title.
    #[tracing::instrument(name = "rename_chat", parent = &self.span, skip_all, fields(chat_id = chat_id))]
    pub async fn rename_chat(
        &self,
        chat_id: i64,
        owner_id: i64,
        title: &str,
    ) -> Result<Chat, ChatError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::Validation("title must not be empty".to_string()));
        }
        let patch = ChatPatch {
            title: Some(bound_title(title, MAX_TITLE_LEN)),
        };

        let mut uow = self.uow.begin().await?;
        owned_chat(&mut uow, chat_id, owner_id).await?;
        let chat = uow
            .chats()
            .update(chat_id, &patch)
            .await?
            .ok_or(ChatError::NotFound)?;
        uow.commit().await?;
        Ok(chat)
    }

    /// Delete an owned chat; its messages go with it.
    #[tracing::instrument(name = "delete_chat", parent = &self.span, skip_all, fields(chat_id = chat_id))]
    pub async fn delete_chat(&self, chat_id: i64, owner_id: i64) -> Result<(), ChatError> {
        let mut uow = self.uow.begin().await?;
        owned_chat(&mut uow, chat_id, owner_id).await?;
        if !uow.chats().delete(chat_id).await? {
            tracing::error!("owned chat vanished inside its own transaction");
            return Err(RepositoryError::InternalConsistency(format!(
                "chat {chat_id} could not be deleted"
            ))
            .into());
        }
        uow.commit().await?;
        tracing::info!("chat deleted");
        Ok(())
    }

    /// Run the completion call under the configured timeout.
    async fn complete(&self, history: &[ChatTurn]) -> Result<String, ChatError> {
        match tokio::time::timeout(self.completion_timeout, self.completion.complete(history)).await
        {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "completion failed");
                Err(err.into())
            }
            Err(_) => {
                let ms = self.completion_timeout.as_millis() as u64;
                tracing::warn!(timeout_ms = ms, "completion timed out");
                Err(CompletionError::Timeout(ms).into())
            }
        }
    }
}

/// Load a chat and check it belongs to `owner_id`. Missing and foreign chats
/// are indistinguishable to the caller.
async fn owned_chat<U: UnitOfWork>(
    uow: &mut U,
    chat_id: i64,
    owner_id: i64,
) -> Result<Chat, ChatError> {
    uow.chats()
        .get_one(chat_id)
        .await?
        .filter(|chat| chat.owner_id == owner_id)
        .ok_or(ChatError::NotFound)
}

fn validate_content(content: &str) -> Result<&str, ChatError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ChatError::Validation(
            "message content must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}
