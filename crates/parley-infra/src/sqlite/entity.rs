//! Table descriptors for the generic SQL repository.
//!
//! Each persisted entity supplies one [`SqlEntity`] impl: its table, how a
//! row maps back to the domain type, and the column/value lists for inserts,
//! patches and filters. Column names are static strings owned by this
//! module; only values are ever bound as parameters.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use parley_core::repository::{ChatFilter, Entity, MessageFilter, UserFilter};
use parley_types::chat::{Chat, ChatPatch, Message, MessagePatch, NewChat, NewMessage};
use parley_types::error::RepositoryError;
use parley_types::llm::MessageRole;
use parley_types::user::{NewUser, Role, User, UserPatch};

/// A value bound into a generated statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
    NullableInt(Option<i64>),
    NullableText(Option<String>),
    Bool(bool),
}

/// Equality conditions plus an optional "newest n" window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFilter {
    pub conditions: Vec<(&'static str, SqlValue)>,
    pub latest: Option<u32>,
}

/// SQL mapping for an [`Entity`].
///
/// Every table has an `id INTEGER PRIMARY KEY` plus `created` and `updated`
/// RFC 3339 text columns, which the repository stamps itself.
pub trait SqlEntity: Entity {
    const TABLE: &'static str;

    fn from_row(row: &SqliteRow) -> Result<Self, RepositoryError>;

    fn insert_values(new: &Self::New) -> Vec<(&'static str, SqlValue)>;

    /// Columns to set. An empty list means the patch is a no-op.
    fn patch_values(patch: &Self::Patch) -> Vec<(&'static str, SqlValue)>;

    fn filter_clause(filter: &Self::Filter) -> SqlFilter;
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Storage(format!("invalid datetime: {e}")))
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| RepositoryError::Storage(format!("column '{name}': {e}")))
}

fn timestamp(row: &SqliteRow, name: &str) -> Result<DateTime<Utc>, RepositoryError> {
    let raw: String = column(row, name)?;
    parse_datetime(&raw)
}

// ---------------------------------------------------------------------------
// users
// ---------------------------------------------------------------------------

impl SqlEntity for User {
    const TABLE: &'static str = "users";

    fn from_row(row: &SqliteRow) -> Result<Self, RepositoryError> {
        let role: String = column(row, "role")?;
        Ok(User {
            id: column(row, "id")?,
            email: column(row, "email")?,
            hashed_password: column(row, "hashed_password")?,
            fullname: column(row, "fullname")?,
            role: role.parse::<Role>().map_err(RepositoryError::Storage)?,
            is_active: column(row, "is_active")?,
            created: timestamp(row, "created")?,
            updated: timestamp(row, "updated")?,
        })
    }

    fn insert_values(new: &NewUser) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("email", SqlValue::Text(new.email.clone())),
            ("hashed_password", SqlValue::Text(new.hashed_password.clone())),
            ("fullname", SqlValue::NullableText(new.fullname.clone())),
            ("role", SqlValue::Text(new.role.to_string())),
            ("is_active", SqlValue::Bool(new.is_active)),
        ]
    }

    fn patch_values(patch: &UserPatch) -> Vec<(&'static str, SqlValue)> {
        let mut values = Vec::new();
        if let Some(email) = &patch.email {
            values.push(("email", SqlValue::Text(email.clone())));
        }
        if let Some(hash) = &patch.hashed_password {
            values.push(("hashed_password", SqlValue::Text(hash.clone())));
        }
        if let Some(fullname) = &patch.fullname {
            values.push(("fullname", SqlValue::Text(fullname.clone())));
        }
        if let Some(role) = patch.role {
            values.push(("role", SqlValue::Text(role.to_string())));
        }
        if let Some(active) = patch.is_active {
            values.push(("is_active", SqlValue::Bool(active)));
        }
        values
    }

    fn filter_clause(filter: &UserFilter) -> SqlFilter {
        let mut conditions = Vec::new();
        if let Some(email) = &filter.email {
            conditions.push(("email", SqlValue::Text(email.clone())));
        }
        SqlFilter {
            conditions,
            latest: None,
        }
    }
}

// ---------------------------------------------------------------------------
// chats
// ---------------------------------------------------------------------------

impl SqlEntity for Chat {
    const TABLE: &'static str = "chats";

    fn from_row(row: &SqliteRow) -> Result<Self, RepositoryError> {
        Ok(Chat {
            id: column(row, "id")?,
            title: column(row, "title")?,
            owner_id: column(row, "owner_id")?,
            created: timestamp(row, "created")?,
            updated: timestamp(row, "updated")?,
        })
    }

    fn insert_values(new: &NewChat) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("title", SqlValue::Text(new.title.clone())),
            ("owner_id", SqlValue::Int(new.owner_id)),
        ]
    }

    fn patch_values(patch: &ChatPatch) -> Vec<(&'static str, SqlValue)> {
        patch
            .title
            .iter()
            .map(|title| ("title", SqlValue::Text(title.clone())))
            .collect()
    }

    fn filter_clause(filter: &ChatFilter) -> SqlFilter {
        SqlFilter {
            conditions: filter
                .owner_id
                .map(|owner| ("owner_id", SqlValue::Int(owner)))
                .into_iter()
                .collect(),
            latest: None,
        }
    }
}

// ---------------------------------------------------------------------------
// messages
// ---------------------------------------------------------------------------

impl SqlEntity for Message {
    const TABLE: &'static str = "messages";

    fn from_row(row: &SqliteRow) -> Result<Self, RepositoryError> {
        let role: String = column(row, "role")?;
        Ok(Message {
            id: column(row, "id")?,
            chat_id: column(row, "chat_id")?,
            sender_id: column(row, "sender_id")?,
            content: column(row, "content")?,
            role: role.parse::<MessageRole>().map_err(RepositoryError::Storage)?,
            created: timestamp(row, "created")?,
        })
    }

    fn insert_values(new: &NewMessage) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("chat_id", SqlValue::Int(new.chat_id())),
            ("sender_id", SqlValue::NullableInt(new.sender_id())),
            ("content", SqlValue::Text(new.content().to_string())),
            ("role", SqlValue::Text(new.role().to_string())),
        ]
    }

    fn patch_values(patch: &MessagePatch) -> Vec<(&'static str, SqlValue)> {
        match *patch {}
    }

    fn filter_clause(filter: &MessageFilter) -> SqlFilter {
        SqlFilter {
            conditions: filter
                .chat_id
                .map(|chat| ("chat_id", SqlValue::Int(chat)))
                .into_iter()
                .collect(),
            latest: filter.latest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_patch_only_sets_present_fields() {
        let patch = UserPatch {
            fullname: Some("Alice".to_string()),
            is_active: Some(false),
            ..Default::default()
        };
        let values = User::patch_values(&patch);
        assert_eq!(
            values,
            vec![
                ("fullname", SqlValue::Text("Alice".to_string())),
                ("is_active", SqlValue::Bool(false)),
            ]
        );
    }

    #[test]
    fn test_empty_patch_has_no_values() {
        assert!(User::patch_values(&UserPatch::default()).is_empty());
        assert!(Chat::patch_values(&ChatPatch::default()).is_empty());
    }

    #[test]
    fn test_assistant_message_binds_null_sender() {
        let values = Message::insert_values(&NewMessage::from_assistant(7, "hi"));
        assert!(values.contains(&("sender_id", SqlValue::NullableInt(None))));
        assert!(values.contains(&("role", SqlValue::Text("assistant".to_string()))));
    }

    #[test]
    fn test_message_filter_carries_window() {
        let clause = Message::filter_clause(&MessageFilter::latest_in_chat(3, 20));
        assert_eq!(clause.conditions, vec![("chat_id", SqlValue::Int(3))]);
        assert_eq!(clause.latest, Some(20));
    }

    #[test]
    fn test_default_filter_matches_everything() {
        assert_eq!(Chat::filter_clause(&ChatFilter::default()), SqlFilter::default());
    }

    #[test]
    fn test_datetime_roundtrip() {
        let now = Utc::now();
        let parsed = parse_datetime(&format_datetime(&now)).unwrap();
        assert_eq!(parsed, now);
    }
}
