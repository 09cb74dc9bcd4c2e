//! # oxide-mapper
//!
//! A statement builder and struct-relational mapper for SQL databases.
//!
//! This crate provides:
//! - A model registry that derives a column schema from `#[derive(Model)]`
//!   records and caches it per type
//! - An expression tree compiled into parameterized SQL with positional `?`
//!   placeholders
//! - `SELECT`, `INSERT` (with upsert), `UPDATE` and `DELETE` builders
//! - `MySQL`, `SQLite` and Postgres dialects
//! - Two interchangeable strategies for reading and writing record fields:
//!   reflective (generated match tables) and offset-based
//!
//! Statement execution is delegated to an [`Executor`] collaborator, such as
//! the one provided by `oxide-mapper-sqlite`.
//!
//! ## Building statements
//!
//! ```rust,ignore
//! use oxide_mapper::{col, not, Db, Model};
//!
//! #[derive(Debug, Default, Model)]
//! struct User {
//!     id: i64,
//!     first_name: String,
//!     age: i8,
//! }
//!
//! let db = Db::new(executor);
//! let query = db
//!     .select::<User>()
//!     .where_clause([not(col("age").gt(18)), col("id").eq(23)])
//!     .build()?;
//!
//! assert_eq!(
//!     query.sql,
//!     "SELECT * FROM `user` WHERE NOT (`age` > ?) AND (`id` = ?);"
//! );
//! ```

// Lets code generated by the derive macro refer to `::oxide_mapper` inside
// this crate's own tests.
extern crate self as oxide_mapper;

pub mod accessor;
pub mod builder;
pub mod db;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod expr;
pub mod model;
pub mod value;

pub use accessor::{AccessorKind, ReflectAccessor, UnsafeAccessor, ValueAccessor};
pub use builder::{Deleter, Inserter, Query, Selector, SqlBuilder, Updater, UpsertBuilder};
pub use db::{Db, DbConfig};
pub use dialect::{Dialect, DialectKind, MySqlDialect, PostgresDialect, SqliteDialect};
pub use error::{Error, Result};
pub use executor::{BufferedRows, ExecResult, Executor, Rows, ScanSlot};
pub use expr::{
    assign, avg, col, count, max, min, not, raw, sum, Aggregate, AggregateFunc, Assignable,
    Assignment, Column, Expr, Op, Predicate, RawExpr, Selectable,
};
pub use model::{Model, ModelOption, Registry, Schema};
pub use value::{FromSqlValue, SqlValue, ToSqlValue};

pub use oxide_mapper_derive::Model;
