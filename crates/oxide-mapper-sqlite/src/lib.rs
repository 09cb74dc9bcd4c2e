//! # oxide-mapper-sqlite
//!
//! `SQLite` executor for `oxide-mapper`, built on `sqlx`.
//!
//! [`SqliteExecutor`] wraps a [`sqlx::SqlitePool`], binds the positional
//! arguments of a compiled statement and buffers result rows into an
//! [`oxide_mapper::BufferedRows`] cursor.
//!
//! `SQLite` uses [type affinity]: a column may hold a value of any storage
//! class. Raw values are read according to their storage class and converted
//! into the record field type when the row is decoded, so text holding a
//! number still decodes into an integer field.
//!
//! [type affinity]: https://www.sqlite.org/datatype3.html
//!
//! ## Example
//!
//! ```rust,ignore
//! use oxide_mapper::{col, Db, DialectKind, Model};
//! use oxide_mapper_sqlite::SqliteExecutor;
//!
//! let pool = sqlx::sqlite::SqlitePoolOptions::new()
//!     .connect("sqlite::memory:")
//!     .await?;
//! let db = Db::new(SqliteExecutor::new(pool)).with_dialect(DialectKind::Sqlite.dialect());
//!
//! let user: User = db.select::<User>().where_clause([col("id").eq(1)]).get().await?;
//! ```

mod executor;

pub use executor::SqliteExecutor;
