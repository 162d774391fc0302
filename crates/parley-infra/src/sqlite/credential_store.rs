//! SQLite credential store.
//!
//! Resolves identities from committed state on the read-only pool. It never
//! joins a unit of work, so a user registered in a still-open unit is not
//! visible here until that unit commits.

use parley_core::auth::store::CredentialStore;
use parley_types::error::RepositoryError;
use parley_types::user::User;
use sqlx::sqlite::SqliteRow;

use super::entity::SqlEntity;
use super::pool::DatabasePool;
use super::repository::map_sqlx_error;

/// SQLite-backed implementation of `CredentialStore`.
#[derive(Clone)]
pub struct SqliteCredentialStore {
    pool: DatabasePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl CredentialStore for SqliteCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row: Option<SqliteRow> = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| map_sqlx_error("user", e))?;

        row.as_ref().map(User::from_row).transpose()
    }
}
