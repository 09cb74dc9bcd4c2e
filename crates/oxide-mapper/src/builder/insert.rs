//! INSERT statement builder with upsert support.

use std::marker::PhantomData;

use super::{Query, SqlBuilder};
use crate::accessor::ValueAccessor;
use crate::db::Db;
use crate::error::{Error, Result};
use crate::executor::{ExecResult, Executor};
use crate::expr::Assignable;
use crate::model::{Field, Model};

/// Conflict handling appended to an INSERT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Upsert {
    /// Logical names of the fields forming the conflict target.
    pub conflict_columns: Vec<String>,
    /// Updates applied to the conflicting row.
    pub assigns: Vec<Assignable>,
}

/// Builds `INSERT` statements for records of type `T`.
#[must_use]
pub struct Inserter<'a, T, E> {
    db: &'a Db<E>,
    values: Vec<&'a T>,
    columns: Vec<String>,
    upsert: Option<Upsert>,
    _model: PhantomData<fn() -> T>,
}

impl<'a, T: Model, E> Inserter<'a, T, E> {
    pub(crate) const fn new(db: &'a Db<E>) -> Self {
        Self {
            db,
            values: Vec::new(),
            columns: Vec::new(),
            upsert: None,
            _model: PhantomData,
        }
    }

    /// Sets the records to insert, one row each.
    pub fn values<I>(mut self, records: I) -> Self
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.values = records.into_iter().collect();
        self
    }

    /// Restricts the inserted columns to the given fields, in this order.
    pub fn columns(mut self, fields: &[&str]) -> Self {
        self.columns = fields.iter().map(|f| String::from(*f)).collect();
        self
    }

    /// Starts the conflict clause.
    pub fn upsert(self) -> UpsertBuilder<'a, T, E> {
        UpsertBuilder {
            inserter: self,
            conflict_columns: Vec::new(),
        }
    }

    /// Compiles the statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsertZeroRow`] without records and
    /// [`Error::UnknownField`] for unresolved columns.
    pub fn build(&self) -> Result<Query> {
        if self.values.is_empty() {
            return Err(Error::InsertZeroRow);
        }
        let schema = self.db.schema::<T>()?;
        let mut b = SqlBuilder::new(&schema, self.db.dialect());

        let fields: Vec<&Field> = if self.columns.is_empty() {
            schema.fields().iter().collect()
        } else {
            self.columns
                .iter()
                .map(|name| b.field(name))
                .collect::<Result<_>>()?
        };

        b.push_str("INSERT INTO ");
        b.quote(schema.table_name());
        b.push('(');
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                b.push(',');
            }
            b.quote(&field.column);
        }
        b.push_str(") VALUES");

        let accessor = self.db.accessor();
        for (row, record) in self.values.iter().enumerate() {
            if row > 0 {
                b.push(',');
            }
            b.push('(');
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    b.push(',');
                }
                let value = accessor.read_field(*record, &schema, field.name)?;
                b.push_placeholder(value);
            }
            b.push(')');
        }

        if let Some(upsert) = &self.upsert {
            self.db.dialect().build_upsert(&mut b, upsert)?;
        }
        Ok(b.finish())
    }
}

impl<T: Model, E: Executor> Inserter<'_, T, E> {
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

/// Collects the conflict target and updates of an upsert.
#[must_use]
pub struct UpsertBuilder<'a, T, E> {
    inserter: Inserter<'a, T, E>,
    conflict_columns: Vec<String>,
}

impl<'a, T: Model, E> UpsertBuilder<'a, T, E> {
    /// Sets the fields forming the conflict target.
    ///
    /// Only dialects with an `ON CONFLICT` clause use them.
    pub fn conflict_columns(mut self, fields: &[&str]) -> Self {
        self.conflict_columns = fields.iter().map(|f| String::from(*f)).collect();
        self
    }

    /// Sets the updates and returns the inserter.
    pub fn update<I, A>(self, assigns: I) -> Inserter<'a, T, E>
    where
        I: IntoIterator<Item = A>,
        A: Into<Assignable>,
    {
        let mut inserter = self.inserter;
        inserter.upsert = Some(Upsert {
            conflict_columns: self.conflict_columns,
            assigns: assigns.into_iter().map(Into::into).collect(),
        });
        inserter
    }
}
