//! Chat and message domain types.
//!
//! A message refers to its chat by id only; there are no back-pointers.
//! Assistant-authored messages carry no sender: `sender_id = None` together
//! with `role = assistant` marks the automated responder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::{ChatTurn, MessageRole};

/// A persisted chat owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub title: String,
    pub owner_id: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChat {
    pub title: String,
    pub owner_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ChatPatch {
    pub title: Option<String>,
}

/// A persisted, immutable chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    pub sender_id: Option<i64>,
    pub content: String,
    pub role: MessageRole,
    pub created: DateTime<Utc>,
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        ChatTurn {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Insert payload for a message.
///
/// Only constructible through [`NewMessage::from_user`] and
/// [`NewMessage::from_assistant`], so role and sender always agree.
#[derive(Debug, Clone)]
pub struct NewMessage {
    chat_id: i64,
    sender_id: Option<i64>,
    content: String,
    role: MessageRole,
}

impl NewMessage {
    pub fn from_user(chat_id: i64, sender_id: i64, content: impl Into<String>) -> Self {
        Self {
            chat_id,
            sender_id: Some(sender_id),
            content: content.into(),
            role: MessageRole::User,
        }
    }

    pub fn from_assistant(chat_id: i64, content: impl Into<String>) -> Self {
        Self {
            chat_id,
            sender_id: None,
            content: content.into(),
            role: MessageRole::Assistant,
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    pub fn sender_id(&self) -> Option<i64> {
        self.sender_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }
}

/// Messages are immutable; this type has no values, so no update can be
/// expressed for them.
#[derive(Debug, Clone)]
pub enum MessagePatch {}

/// Result of one chat orchestration: the chat and the two messages written
/// in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub chat: Chat,
    pub user_message: Message,
    pub assistant_message: Message,
}
