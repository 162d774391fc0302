//! Persistence ports.
//!
//! One generic [`Repository`] trait covers every entity; the entity-specific
//! parts (write payloads, filters) hang off [`Entity`]. Repositories are only
//! ever obtained from a [`UnitOfWork`](unit_of_work::UnitOfWork) and operate
//! inside its transaction. The infrastructure layer (parley-infra) supplies
//! the SQL implementation.

pub mod unit_of_work;

use parley_types::chat::{Chat, ChatPatch, Message, MessagePatch, NewChat, NewMessage};
use parley_types::error::RepositoryError;
use parley_types::user::{NewUser, User, UserPatch};

/// A persisted record type the generic repository can manage.
pub trait Entity: Send + Sync + Sized + 'static {
    /// Insert payload.
    type New: Send + Sync;
    /// Partial update payload.
    type Patch: Send + Sync;
    /// Equality filter for `find_one` / `get_all`.
    type Filter: Send + Sync + Default;

    /// Human-readable entity name used in error messages.
    const NAME: &'static str;

    fn id(&self) -> i64;
}

impl Entity for User {
    type New = NewUser;
    type Patch = UserPatch;
    type Filter = UserFilter;
    const NAME: &'static str = "user";

    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Chat {
    type New = NewChat;
    type Patch = ChatPatch;
    type Filter = ChatFilter;
    const NAME: &'static str = "chat";

    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Message {
    type New = NewMessage;
    type Patch = MessagePatch;
    type Filter = MessageFilter;
    const NAME: &'static str = "message";

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub email: Option<String>,
}

impl UserFilter {
    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatFilter {
    pub owner_id: Option<i64>,
}

impl ChatFilter {
    pub fn owned_by(owner_id: i64) -> Self {
        Self {
            owner_id: Some(owner_id),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub chat_id: Option<i64>,
    /// Keep only the newest `n` matches (still returned oldest first).
    pub latest: Option<u32>,
}

impl MessageFilter {
    pub fn in_chat(chat_id: i64) -> Self {
        Self {
            chat_id: Some(chat_id),
            latest: None,
        }
    }

    pub fn latest_in_chat(chat_id: i64, n: u32) -> Self {
        Self {
            chat_id: Some(chat_id),
            latest: Some(n),
        }
    }
}

/// Create/read/update/delete for one entity type, bound to the transaction of
/// the unit of work it was borrowed from.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait Repository<E: Entity>: Send {
    /// Insert one record and return it with its generated id.
    ///
    /// Fails with `Conflict` on a uniqueness violation and `Storage` on any
    /// other data-layer failure.
    fn add(
        &mut self,
        data: &E::New,
    ) -> impl std::future::Future<Output = Result<E, RepositoryError>> + Send;

    /// Look up a record by id. More than one row is an `InternalConsistency`
    /// error, never silently resolved.
    fn get_one(
        &mut self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<E>, RepositoryError>> + Send;

    /// Look up the single record matching `filter`. More than one match is an
    /// `InternalConsistency` error.
    fn find_one(
        &mut self,
        filter: &E::Filter,
    ) -> impl std::future::Future<Output = Result<Option<E>, RepositoryError>> + Send;

    /// All records matching `filter`, ordered by ascending id. No match is an
    /// empty vector, not an error.
    fn get_all(
        &mut self,
        filter: &E::Filter,
    ) -> impl std::future::Future<Output = Result<Vec<E>, RepositoryError>> + Send;

    /// Apply a partial update. An empty patch is a no-op returning `None`; a
    /// missing row also returns `None`.
    fn update(
        &mut self,
        id: i64,
        data: &E::Patch,
    ) -> impl std::future::Future<Output = Result<Option<E>, RepositoryError>> + Send;

    /// Delete by id. Returns `true` if a row was removed.
    fn delete(
        &mut self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
