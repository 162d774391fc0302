//! Unit of Work ports.
//!
//! A unit is one transaction. [`UnitOfWorkFactory::begin`] is the only way to
//! open one; [`UnitOfWork::commit`] and [`UnitOfWork::rollback`] consume it.
//! A unit that is dropped without `commit` rolls back, so an early `?`
//! return, a panic, or a cancelled future never leaves a partial write
//! visible. Nesting is impossible: a unit cannot open another unit.

use parley_types::chat::{Chat, Message};
use parley_types::error::RepositoryError;
use parley_types::user::User;

use super::Repository;

/// One open transaction with a repository per entity type bound to it.
pub trait UnitOfWork: Send {
    fn users(&mut self) -> impl Repository<User> + Send + '_;

    fn chats(&mut self) -> impl Repository<Chat> + Send + '_;

    fn messages(&mut self) -> impl Repository<Message> + Send + '_;

    /// Make every write since `begin` durable.
    fn commit(self) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Discard every write since `begin`.
    fn rollback(self) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

/// Opens units of work. Shared across requests; each unit it opens is not.
pub trait UnitOfWorkFactory: Send + Sync {
    type Unit: UnitOfWork;

    fn begin(&self) -> impl std::future::Future<Output = Result<Self::Unit, RepositoryError>> + Send;
}
