//! UPDATE statement builder.

use std::marker::PhantomData;

use super::{Query, SqlBuilder};
use crate::db::Db;
use crate::error::{Error, Result};
use crate::executor::{ExecResult, Executor};
use crate::expr::{Expr, Op, Predicate};
use crate::model::Model;

/// Builds `UPDATE` statements for records of type `T`.
///
/// SET entries are written as predicates: `col("age").eq(19)` becomes
/// `` `age` = ? ``. Any other shape is rejected.
#[must_use]
pub struct Updater<'a, T, E> {
    db: &'a Db<E>,
    assigns: Vec<Predicate>,
    predicates: Vec<Predicate>,
    _model: PhantomData<fn() -> T>,
}

impl<'a, T: Model, E> Updater<'a, T, E> {
    pub(crate) const fn new(db: &'a Db<E>) -> Self {
        Self {
            db,
            assigns: Vec::new(),
            predicates: Vec::new(),
            _model: PhantomData,
        }
    }

    /// Adds SET entries.
    pub fn set<I>(mut self, assigns: I) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        self.assigns.extend(assigns);
        self
    }

    /// Adds WHERE predicates, combined with `AND`.
    pub fn where_clause<I>(mut self, predicates: I) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        self.predicates.extend(predicates);
        self
    }

    /// Compiles the statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperator`] when there is no SET entry or
    /// an entry is not `column = value`, and [`Error::UnknownField`] for
    /// unresolved columns.
    pub fn build(&self) -> Result<Query> {
        let schema = self.db.schema::<T>()?;
        if self.assigns.is_empty() {
            return Err(Error::UnsupportedOperator);
        }
        let mut b = SqlBuilder::new(&schema, self.db.dialect());

        b.push_str("UPDATE ");
        b.quote(schema.table_name());
        b.push_str(" SET ");
        for (i, assign) in self.assigns.iter().enumerate() {
            if i > 0 {
                b.push_str(", ");
            }
            let (Some(Op::Eq), Some(Expr::Column(column)), Some(Expr::Value(value))) = (
                assign.op,
                assign.left.as_deref(),
                assign.right.as_deref(),
            ) else {
                return Err(Error::UnsupportedOperator);
            };
            b.write_column(&column.name)?;
            b.push_str(" = ");
            b.push_placeholder(value.clone());
        }

        b.push_where(&self.predicates)?;
        Ok(b.finish())
    }
}

impl<T: Model, E: Executor> Updater<'_, T, E> {
    /// Builds and executes the statement.
    ///
    /// # Errors
    ///
    /// Returns any build or executor error.
    #[allow(clippy::future_not_send)]
    pub async fn exec(&self) -> Result<ExecResult> {
        let query = self.build()?;
        self.db.execute(&query).await
    }
}
