//! DELETE statement builder.

use std::marker::PhantomData;

use super::{Query, SqlBuilder};
use crate::db::Db;
use crate::error::Result;
use crate::executor::{ExecResult, Executor};
use crate::expr::Predicate;
use crate::model::Model;

/// Builds `DELETE` statements for records of type `T`.
///
/// Without a WHERE clause the statement deletes every row of the table.
#[must_use]
pub struct Deleter<'a, T, E> {
    db: &'a Db<E>,
    predicates: Vec<Predicate>,
    _model: PhantomData<fn() -> T>,
}

impl<'a, T: Model, E> Deleter<'a, T, E> {
    pub(crate) const fn new(db: &'a Db<E>) -> Self {
        Self {
            db,
            predicates: Vec::new(),
            _model: PhantomData,
        }
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
    /// Returns [`Error::UnknownField`](crate::Error::UnknownField) for
    /// unresolved columns.
    pub fn build(&self) -> Result<Query> {
        let schema = self.db.schema::<T>()?;
        let mut b = SqlBuilder::new(&schema, self.db.dialect());
        b.push_str("DELETE FROM ");
        b.quote(schema.table_name());
        b.push_where(&self.predicates)?;
        Ok(b.finish())
    }
}

impl<T: Model, E: Executor> Deleter<'_, T, E> {
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
