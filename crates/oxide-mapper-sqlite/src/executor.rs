//! `sqlx`-backed implementation of the executor contract.

use oxide_mapper::{BufferedRows, Error, ExecResult, Executor, Query, Result, SqlValue};
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};
use tracing::trace;

/// Runs statements against a `SQLite` connection pool.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Wraps a pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl From<SqlitePool> for SqliteExecutor {
    fn from(pool: SqlitePool) -> Self {
        Self::new(pool)
    }
}

impl Executor for SqliteExecutor {
    type Rows = BufferedRows;

    async fn execute(&self, query: &Query) -> Result<ExecResult> {
        let result = bind_all(&query.sql, &query.args)
            .execute(&self.pool)
            .await
            .map_err(Error::driver)?;
        Ok(ExecResult::new(
            result.rows_affected(),
            result.last_insert_rowid(),
        ))
    }

    async fn query(&self, query: &Query) -> Result<BufferedRows> {
        let rows = bind_all(&query.sql, &query.args)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::driver)?;
        trace!(rows = rows.len(), "fetched rows");

        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let mut buffered = BufferedRows::new(columns);
        for row in &rows {
            buffered.push_row(decode_row(row)?);
        }
        Ok(buffered)
    }
}

fn bind_all<'q>(
    sql: &'q str,
    args: &[SqlValue],
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    args.iter()
        .cloned()
        .fold(sqlx::query(sql), bind_param)
}

/// Binds a SqlValue parameter to a raw query.
fn bind_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

fn decode_row(row: &SqliteRow) -> Result<Vec<SqlValue>> {
    (0..row.len()).map(|i| decode_value(row, i)).collect()
}

fn decode_value(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index).map_err(Error::driver)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();

    let value = match type_name.as_str() {
        "BOOLEAN" => SqlValue::Bool(row.try_get_unchecked(index).map_err(Error::driver)?),
        "INTEGER" | "INT" | "BIGINT" | "INT8" => {
            SqlValue::Int(row.try_get_unchecked(index).map_err(Error::driver)?)
        }
        "REAL" | "FLOAT" | "DOUBLE" => {
            SqlValue::Float(row.try_get_unchecked(index).map_err(Error::driver)?)
        }
        "BLOB" => SqlValue::Blob(row.try_get_unchecked(index).map_err(Error::driver)?),
        _ => SqlValue::Text(row.try_get_unchecked(index).map_err(Error::driver)?),
    };
    Ok(value)
}
