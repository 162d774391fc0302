//! Generic SQL repository.
//!
//! `SqlRepository` implements `Repository<E>` from `parley-core` for every
//! entity with an [`SqlEntity`] descriptor. It borrows the connection of the
//! transaction it was handed out from and never begins or ends a transaction
//! itself. Statements are assembled with `QueryBuilder`; values are always
//! bound, never interpolated.

use std::marker::PhantomData;

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use parley_core::repository::Repository;
use parley_types::error::RepositoryError;

use super::entity::{SqlEntity, SqlValue, format_datetime};

/// Repository for `E` bound to one open transaction.
pub struct SqlRepository<'c, E> {
    conn: &'c mut SqliteConnection,
    _entity: PhantomData<fn() -> E>,
}

impl<'c, E: SqlEntity> SqlRepository<'c, E> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    async fn fetch_all(
        &mut self,
        mut query: QueryBuilder<'_, Sqlite>,
    ) -> Result<Vec<E>, RepositoryError> {
        let rows = query
            .build()
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, e))?;
        rows.iter().map(E::from_row).collect()
    }
}

/// Map a sqlx error onto the repository taxonomy.
pub(crate) fn map_sqlx_error(entity: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::Conflict(format!("{entity}: {}", db_err.message()))
        }
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        other => RepositoryError::Storage(other.to_string()),
    }
}

fn push_value(query: &mut QueryBuilder<'_, Sqlite>, value: SqlValue) {
    match value {
        SqlValue::Int(v) => query.push_bind(v),
        SqlValue::Text(v) => query.push_bind(v),
        SqlValue::NullableInt(v) => query.push_bind(v),
        SqlValue::NullableText(v) => query.push_bind(v),
        SqlValue::Bool(v) => query.push_bind(v),
    };
}

fn push_where(query: &mut QueryBuilder<'_, Sqlite>, conditions: Vec<(&'static str, SqlValue)>) {
    for (i, (column, value)) in conditions.into_iter().enumerate() {
        query.push(if i == 0 { " WHERE " } else { " AND " });
        query.push(column);
        query.push(" = ");
        push_value(query, value);
    }
}

/// Collapse a `LIMIT 2` result into at most one record.
fn at_most_one<E: SqlEntity>(
    rows: Vec<SqliteRow>,
    lookup: &str,
) -> Result<Option<E>, RepositoryError> {
    match rows.as_slice() {
        [] => Ok(None),
        [row] => E::from_row(row).map(Some),
        _ => {
            tracing::error!(entity = E::NAME, lookup, "lookup matched more than one row");
            Err(RepositoryError::InternalConsistency(format!(
                "more than one {} matches {lookup}",
                E::NAME
            )))
        }
    }
}

impl<E: SqlEntity> Repository<E> for SqlRepository<'_, E> {
    async fn add(&mut self, data: &E::New) -> Result<E, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let mut values = E::insert_values(data);
        values.push(("created", SqlValue::Text(now.clone())));
        values.push(("updated", SqlValue::Text(now)));

        let mut query = QueryBuilder::<Sqlite>::new("INSERT INTO ");
        query.push(E::TABLE).push(" (");
        for (i, (column, _)) in values.iter().enumerate() {
            if i > 0 {
                query.push(", ");
            }
            query.push(*column);
        }
        query.push(") VALUES (");
        for (i, (_, value)) in values.into_iter().enumerate() {
            if i > 0 {
                query.push(", ");
            }
            push_value(&mut query, value);
        }
        query.push(") RETURNING *");

        let row = query
            .build()
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, e))?;
        let record = E::from_row(&row)?;

        tracing::debug!(entity = E::NAME, id = record.id(), "inserted");
        Ok(record)
    }

    async fn get_one(&mut self, id: i64) -> Result<Option<E>, RepositoryError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM ");
        query.push(E::TABLE).push(" WHERE id = ");
        query.push_bind(id);
        query.push(" LIMIT 2");

        let rows = query
            .build()
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, e))?;
        at_most_one(rows, "id")
    }

    async fn find_one(&mut self, filter: &E::Filter) -> Result<Option<E>, RepositoryError> {
        let clause = E::filter_clause(filter);
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM ");
        query.push(E::TABLE);
        push_where(&mut query, clause.conditions);
        query.push(" ORDER BY id LIMIT 2");

        let rows = query
            .build()
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, e))?;
        at_most_one(rows, "filter")
    }

    async fn get_all(&mut self, filter: &E::Filter) -> Result<Vec<E>, RepositoryError> {
        let clause = E::filter_clause(filter);
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM ");

        match clause.latest {
            // Newest n by id, handed back oldest first.
            Some(n) => {
                query.push("(SELECT * FROM ").push(E::TABLE);
                push_where(&mut query, clause.conditions);
                query.push(" ORDER BY id DESC LIMIT ");
                query.push_bind(i64::from(n));
                query.push(") ORDER BY id ASC");
            }
            None => {
                query.push(E::TABLE);
                push_where(&mut query, clause.conditions);
                query.push(" ORDER BY id ASC");
            }
        }

        self.fetch_all(query).await
    }

    async fn update(&mut self, id: i64, data: &E::Patch) -> Result<Option<E>, RepositoryError> {
        let mut values = E::patch_values(data);
        if values.is_empty() {
            tracing::debug!(entity = E::NAME, id, "empty patch, nothing to update");
            return Ok(None);
        }
        values.push(("updated", SqlValue::Text(format_datetime(&Utc::now()))));

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE ");
        query.push(E::TABLE).push(" SET ");
        for (i, (column, value)) in values.into_iter().enumerate() {
            if i > 0 {
                query.push(", ");
            }
            query.push(column).push(" = ");
            push_value(&mut query, value);
        }
        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" RETURNING *");

        let row = query
            .build()
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, e))?;
        row.as_ref().map(E::from_row).transpose()
    }

    async fn delete(&mut self, id: i64) -> Result<bool, RepositoryError> {
        let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM ");
        query.push(E::TABLE).push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(&mut *self.conn)
            .await
            .map_err(|e| map_sqlx_error(E::NAME, e))?;
        Ok(result.rows_affected() > 0)
    }
}
