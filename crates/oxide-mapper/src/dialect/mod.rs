//! SQL Dialect support.
//!
//! Dialects differ in how identifiers are quoted and in the syntax used to
//! update a row when an INSERT conflicts with an existing one.

mod mysql;
mod postgres;
mod sqlite;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::builder::{SqlBuilder, Upsert};
use crate::error::{Error, Result};
use crate::expr::Assignable;

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '`'
    }

    /// Quotes an identifier.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        format!("{quote}{name}{quote}")
    }

    /// Appends the conflict clause of an upsert, including its leading space.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] for unresolved columns.
    fn build_upsert(&self, b: &mut SqlBuilder<'_>, upsert: &Upsert) -> Result<()>;
}

/// Writes ``ON CONFLICT[ (`k`,..)] DO UPDATE SET ...``, shared by `SQLite` and
/// Postgres. A bare column takes the rejected row's value via `excluded`.
fn build_on_conflict(b: &mut SqlBuilder<'_>, upsert: &Upsert) -> Result<()> {
    b.push_str(" ON CONFLICT");
    if !upsert.conflict_columns.is_empty() {
        b.push_str(" (");
        for (i, column) in upsert.conflict_columns.iter().enumerate() {
            if i > 0 {
                b.push(',');
            }
            b.write_column(column)?;
        }
        b.push(')');
    }
    b.push_str(" DO UPDATE SET ");
    for (i, assign) in upsert.assigns.iter().enumerate() {
        if i > 0 {
            b.push(',');
        }
        match assign {
            Assignable::Assign(a) => {
                b.write_column(&a.column)?;
                b.push('=');
                b.push_placeholder(a.value.clone());
            }
            Assignable::Column(c) => {
                let column = b.field(&c.name)?.column.as_str();
                b.quote(column);
                b.push_str("=excluded.");
                b.quote(column);
            }
        }
    }
    Ok(())
}

/// Selects a built-in dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    MySql,
    Sqlite,
    Postgres,
}

impl DialectKind {
    /// Returns the configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }

    /// Returns the dialect implementation.
    #[must_use]
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            Self::MySql => Arc::new(MySqlDialect),
            Self::Sqlite => Arc::new(SqliteDialect),
            Self::Postgres => Arc::new(PostgresDialect),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mysql" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            "postgres" => Ok(Self::Postgres),
            other => Err(Error::Config(format!("unknown dialect: {other}"))),
        }
    }
}
