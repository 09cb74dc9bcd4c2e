//! SELECT statement builder.

use std::marker::PhantomData;

use super::{Query, SqlBuilder};
use crate::accessor::ValueAccessor;
use crate::db::Db;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::expr::{Predicate, Selectable};
use crate::model::Model;

/// Builds `SELECT` statements for records of type `T`.
#[must_use]
pub struct Selector<'a, T, E> {
    db: &'a Db<E>,
    columns: Vec<Selectable>,
    table: String,
    predicates: Vec<Predicate>,
    _model: PhantomData<fn() -> T>,
}

impl<'a, T: Model, E> Selector<'a, T, E> {
    pub(crate) const fn new(db: &'a Db<E>) -> Self {
        Self {
            db,
            columns: Vec::new(),
            table: String::new(),
            predicates: Vec::new(),
            _model: PhantomData,
        }
    }

    /// Adds entries to the select list. An empty list selects `*`.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selectable>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Overrides the table reference.
    ///
    /// The text is emitted verbatim, so it can carry a schema qualifier such
    /// as ``"`db`.`table`"``. An empty string restores the default.
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
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
    /// Returns [`Error::UnknownField`] for unresolved columns, or any schema
    /// derivation error.
    pub fn build(&self) -> Result<Query> {
        let schema = self.db.schema::<T>()?;
        let mut b = SqlBuilder::new(&schema, self.db.dialect());

        b.push_str("SELECT ");
        if self.columns.is_empty() {
            b.push('*');
        }
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                b.push(',');
            }
            match column {
                Selectable::Column(c) => b.write_column(&c.name)?,
                Selectable::Aggregate(agg) => {
                    b.push_str(agg.func.as_str());
                    b.push('(');
                    b.write_column(&agg.column)?;
                    b.push(')');
                }
                Selectable::Raw(raw) => b.push_raw(&raw.sql, &raw.args),
            }
        }

        b.push_str(" FROM ");
        if self.table.is_empty() {
            b.quote(schema.table_name());
        } else {
            b.push_str(&self.table);
        }

        b.push_where(&self.predicates)?;
        Ok(b.finish())
    }
}

impl<T: Model + Default, E: Executor> Selector<'_, T, E> {
    /// Runs the query and decodes the first row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRows`] when the result is empty, or any build,
    /// executor or decoding error.
    #[allow(clippy::future_not_send)]
    pub async fn get(&self) -> Result<T> {
        let query = self.build()?;
        let schema = self.db.schema::<T>()?;
        let mut rows = self.db.fetch(&query).await?;

        let mut record = T::default();
        self.db
            .accessor()
            .decode_row(&mut rows, &mut record, &schema)?;
        Ok(record)
    }

    /// Runs the query and decodes every row.
    ///
    /// # Errors
    ///
    /// Returns any build, executor or decoding error.
    #[allow(clippy::future_not_send)]
    pub async fn get_multi(&self) -> Result<Vec<T>> {
        let query = self.build()?;
        let schema = self.db.schema::<T>()?;
        let mut rows = self.db.fetch(&query).await?;

        let accessor = self.db.accessor();
        let mut records = Vec::new();
        loop {
            let mut record = T::default();
            match accessor.decode_row(&mut rows, &mut record, &schema) {
                Ok(()) => records.push(record),
                Err(Error::NoRows) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(records)
    }
}
