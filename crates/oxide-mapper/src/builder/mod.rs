//! Statement builders and the expression compiler.
//!
//! Each builder resolves the record schema through the [`Db`] registry, then
//! writes SQL text and arguments into a [`SqlBuilder`]. The builders are
//! values: every fluent method returns a new builder, and `build` can be
//! called any number of times.
//!
//! The async `get`, `get_multi` and `exec` methods await the [`Executor`]
//! futures directly. [`Executor`] puts no `Send` bound on them, so these
//! futures are `Send` only when the executor's are.
//!
//! # Example
//!
//! ```rust,ignore
//! let query = db
//!     .delete::<TestModel>()
//!     .where_clause([col("id").eq(12)])
//!     .build()?;
//!
//! assert_eq!(query.sql, "DELETE FROM `test_model` WHERE `id` = ?;");
//! assert_eq!(query.args, vec![SqlValue::Int(12)]);
//! ```
//!
//! [`Db`]: crate::db::Db
//! [`Executor`]: crate::executor::Executor

mod delete;
mod insert;
mod select;
mod update;

pub use delete::Deleter;
pub use insert::{Inserter, Upsert, UpsertBuilder};
pub use select::Selector;
pub use update::Updater;

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::expr::{Expr, Op, Predicate};
use crate::model::{Field, Schema};
use crate::value::SqlValue;

/// A compiled statement: SQL text and its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// SQL text, terminated with `;`.
    pub sql: String,
    /// Arguments, one per `?` placeholder, in order.
    pub args: Vec<SqlValue>,
}

/// Accumulates SQL text and arguments for one statement.
#[derive(Debug)]
pub struct SqlBuilder<'a> {
    sql: String,
    args: Vec<SqlValue>,
    schema: &'a Schema,
    dialect: &'a dyn Dialect,
}

impl<'a> SqlBuilder<'a> {
    /// Creates a builder for a statement over `schema`.
    #[must_use]
    pub const fn new(schema: &'a Schema, dialect: &'a dyn Dialect) -> Self {
        Self {
            sql: String::new(),
            args: Vec::new(),
            schema,
            dialect,
        }
    }

    /// Returns the schema of the statement's record type.
    #[must_use]
    pub const fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Returns the dialect.
    #[must_use]
    pub const fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    /// Returns the SQL written so far.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Appends text.
    pub fn push_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    /// Appends a character.
    pub fn push(&mut self, c: char) {
        self.sql.push(c);
    }

    /// Appends a quoted identifier.
    pub fn quote(&mut self, name: &str) {
        let quote = self.dialect.identifier_quote();
        self.sql.push(quote);
        self.sql.push_str(name);
        self.sql.push(quote);
    }

    /// Resolves a logical field name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] if the schema has no such field.
    pub fn field(&self, name: &str) -> Result<&'a Field> {
        self.schema
            .field(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// Resolves a logical field name and appends its quoted column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] if the schema has no such field.
    pub fn write_column(&mut self, name: &str) -> Result<()> {
        let field = self.field(name)?;
        self.quote(&field.column);
        Ok(())
    }

    /// Records an argument without writing a placeholder.
    pub fn push_arg(&mut self, value: SqlValue) {
        self.args.push(value);
    }

    /// Appends a `?` placeholder bound to `value`.
    pub fn push_placeholder(&mut self, value: SqlValue) {
        self.sql.push('?');
        self.args.push(value);
    }

    /// Appends raw SQL and its arguments.
    pub fn push_raw(&mut self, sql: &str, args: &[SqlValue]) {
        self.sql.push_str(sql);
        self.args.extend_from_slice(args);
    }

    /// Compiles an expression. `None` writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] for unresolved columns and
    /// [`Error::UnsupportedExpression`] for aggregates and assignments, which
    /// are only valid in select and upsert lists.
    pub fn compile(&mut self, expr: Option<&Expr>) -> Result<()> {
        let Some(expr) = expr else {
            return Ok(());
        };
        match expr {
            Expr::Column(column) => self.write_column(&column.name),
            Expr::Value(value) => {
                self.push_placeholder(value.clone());
                Ok(())
            }
            Expr::Predicate(predicate) => self.compile_predicate(predicate),
            Expr::Raw(raw) => {
                self.push_raw(&raw.sql, &raw.args);
                Ok(())
            }
            Expr::Aggregate(_) | Expr::Assignment(_) => Err(Error::UnsupportedExpression),
        }
    }

    fn compile_predicate(&mut self, predicate: &Predicate) -> Result<()> {
        if let Some(left) = predicate.left.as_deref() {
            // NOT already reads as a prefix, so it needs no parentheses.
            let wrap = matches!(left, Expr::Predicate(p) if p.op != Some(Op::Not));
            self.compile_operand(left, wrap)?;
        }
        if let Some(op) = predicate.op {
            if predicate.left.is_some() {
                self.sql.push(' ');
            }
            self.sql.push_str(op.as_str());
            if predicate.right.is_some() {
                self.sql.push(' ');
            }
        }
        if let Some(right) = predicate.right.as_deref() {
            let wrap = matches!(right, Expr::Predicate(_));
            self.compile_operand(right, wrap)?;
        }
        Ok(())
    }

    fn compile_operand(&mut self, expr: &Expr, wrap: bool) -> Result<()> {
        if wrap {
            self.sql.push('(');
        }
        self.compile(Some(expr))?;
        if wrap {
            self.sql.push(')');
        }
        Ok(())
    }

    /// Appends ` WHERE <p1 AND p2 ...>`. An empty list writes nothing.
    ///
    /// # Errors
    ///
    /// Propagates compilation errors.
    pub fn push_where(&mut self, predicates: &[Predicate]) -> Result<()> {
        let Some(combined) = predicates.iter().cloned().reduce(Predicate::and) else {
            return Ok(());
        };
        self.sql.push_str(" WHERE ");
        self.compile_predicate(&combined)
    }

    /// Terminates the statement with `;`.
    #[must_use]
    pub fn finish(mut self) -> Query {
        self.sql.push(';');
        Query {
            sql: self.sql,
            args: self.args,
        }
    }
}
