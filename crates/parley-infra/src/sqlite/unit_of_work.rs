//! SQLite Unit of Work.
//!
//! `SqliteUnitOfWorkFactory::begin` opens a transaction on the writer pool;
//! the returned unit owns it and lends repositories bound to it. sqlx rolls a
//! `Transaction` back when it is dropped without `commit`, so any early
//! return, panic or cancelled request discards the unit's writes.

use sqlx::{Sqlite, Transaction};

use parley_core::repository::Repository;
use parley_core::repository::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use parley_types::chat::{Chat, Message};
use parley_types::error::RepositoryError;
use parley_types::user::User;

use super::pool::DatabasePool;
use super::repository::{SqlRepository, map_sqlx_error};

/// Opens units of work on the writer pool.
#[derive(Clone)]
pub struct SqliteUnitOfWorkFactory {
    pool: DatabasePool,
}

impl SqliteUnitOfWorkFactory {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl UnitOfWorkFactory for SqliteUnitOfWorkFactory {
    type Unit = SqliteUnitOfWork;

    async fn begin(&self) -> Result<SqliteUnitOfWork, RepositoryError> {
        let tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| map_sqlx_error("transaction", e))?;
        tracing::trace!("unit of work started");
        Ok(SqliteUnitOfWork { tx })
    }
}

/// One open writer transaction.
pub struct SqliteUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork for SqliteUnitOfWork {
    fn users(&mut self) -> impl Repository<User> + Send + '_ {
        SqlRepository::<User>::new(&mut self.tx)
    }

    fn chats(&mut self) -> impl Repository<Chat> + Send + '_ {
        SqlRepository::<Chat>::new(&mut self.tx)
    }

    fn messages(&mut self) -> impl Repository<Message> + Send + '_ {
        SqlRepository::<Message>::new(&mut self.tx)
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("transaction", e))?;
        tracing::trace!("unit of work committed");
        Ok(())
    }

    async fn rollback(self) -> Result<(), RepositoryError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("transaction", e))?;
        tracing::trace!("unit of work rolled back");
        Ok(())
    }
}
