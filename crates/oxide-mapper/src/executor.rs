//! Contract with the database collaborator.
//!
//! The mapper never talks to a database itself. It hands a compiled
//! [`Query`] to an [`Executor`] and, for reads, walks the returned [`Rows`]
//! cursor.

use std::collections::VecDeque;

use crate::builder::Query;
use crate::error::{Error, Result};
use crate::value::{FieldType, SqlValue};

/// Runs compiled statements.
#[allow(async_fn_in_trait)]
pub trait Executor {
    /// Row cursor returned by [`Executor::query`].
    type Rows: Rows;

    /// Executes a statement that returns no rows.
    async fn execute(&self, query: &Query) -> Result<ExecResult>;

    /// Executes a statement and returns a cursor over its rows.
    async fn query(&self, query: &Query) -> Result<Self::Rows>;
}

/// Cursor over the rows of a result set.
pub trait Rows {
    /// Advances to the next row. Returns `false` when exhausted.
    ///
    /// # Errors
    ///
    /// Returns a driver error if the next row cannot be fetched.
    fn next(&mut self) -> Result<bool>;

    /// Returns the column names of the result set.
    ///
    /// # Errors
    ///
    /// Returns a driver error if the columns are not available.
    fn columns(&self) -> Result<Vec<String>>;

    /// Fills `slots` from the current row, one slot per column in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Scan`] when a value does not fit its slot.
    fn scan(&mut self, slots: &mut [ScanSlot]) -> Result<()>;
}

/// Typed destination for one column of a row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSlot {
    column: String,
    ty: FieldType,
    value: SqlValue,
}

impl ScanSlot {
    /// Creates an empty slot for `column`.
    #[must_use]
    pub const fn new(column: String, ty: FieldType) -> Self {
        Self {
            column,
            ty,
            value: SqlValue::Null,
        }
    }

    /// Returns the column name.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns the expected value type.
    #[must_use]
    pub const fn ty(&self) -> FieldType {
        self.ty
    }

    /// Returns the scanned value.
    #[must_use]
    pub const fn value(&self) -> &SqlValue {
        &self.value
    }

    /// Stores a raw driver value, converted to the slot type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Scan`] when the value cannot represent the slot type.
    pub fn fill(&mut self, raw: SqlValue) -> Result<()> {
        self.value = self.ty.coerce(raw).map_err(|source| Error::Scan {
            column: self.column.clone(),
            source,
        })?;
        Ok(())
    }

    /// Splits the slot into its column name and value.
    #[must_use]
    pub fn into_parts(self) -> (String, SqlValue) {
        (self.column, self.value)
    }
}

/// Outcome of a successful [`Executor::execute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    rows_affected: u64,
    last_insert_id: i64,
}

impl ExecResult {
    /// Creates a result.
    #[must_use]
    pub const fn new(rows_affected: u64, last_insert_id: i64) -> Self {
        Self {
            rows_affected,
            last_insert_id,
        }
    }

    /// Number of rows changed by the statement.
    #[must_use]
    pub const fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Row id generated by the last insert.
    #[must_use]
    pub const fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }
}

/// A [`Rows`] cursor over rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct BufferedRows {
    columns: Vec<String>,
    pending: VecDeque<Vec<SqlValue>>,
    current: Option<Vec<SqlValue>>,
}

impl BufferedRows {
    /// Creates an empty result set with the given columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            pending: VecDeque::new(),
            current: None,
        }
    }

    /// Adds a row.
    #[must_use]
    pub fn add_row(mut self, row: Vec<SqlValue>) -> Self {
        self.push_row(row);
        self
    }

    /// Adds a row in place.
    pub fn push_row(&mut self, row: Vec<SqlValue>) {
        self.pending.push_back(row);
    }

    /// Returns the number of rows not yet visited.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl Rows for BufferedRows {
    fn next(&mut self) -> Result<bool> {
        self.current = self.pending.pop_front();
        Ok(self.current.is_some())
    }

    fn columns(&self) -> Result<Vec<String>> {
        Ok(self.columns.clone())
    }

    fn scan(&mut self, slots: &mut [ScanSlot]) -> Result<()> {
        let Some(row) = self.current.take() else {
            return Err(Error::NoRows);
        };
        if row.len() != slots.len() {
            return Err(Error::driver(format!(
                "row has {} values, {} destinations given",
                row.len(),
                slots.len()
            )));
        }
        for (slot, value) in slots.iter_mut().zip(row) {
            slot.fill(value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    #[test]
    fn test_buffered_rows_walk() {
        let mut rows = BufferedRows::new(["id", "age"])
            .add_row(vec![SqlValue::Int(1), SqlValue::Int(18)])
            .add_row(vec![SqlValue::Int(2), SqlValue::Null]);

        let mut slots = vec![
            ScanSlot::new(String::from("id"), FieldType::new(ValueKind::I64)),
            ScanSlot::new(String::from("age"), FieldType::nullable(ValueKind::I8)),
        ];
        assert!(rows.next().unwrap());
        rows.scan(&mut slots).unwrap();
        assert_eq!(slots[1].value(), &SqlValue::Int(18));

        assert!(rows.next().unwrap());
        rows.scan(&mut slots).unwrap();
        assert_eq!(slots[1].value(), &SqlValue::Null);

        assert!(!rows.next().unwrap());
        assert_eq!(rows.remaining(), 0);
    }

    #[test]
    fn test_scan_rejects_value_count_mismatch() {
        let mut rows = BufferedRows::new(["id"]).add_row(vec![SqlValue::Int(1)]);
        let mut slots: Vec<ScanSlot> = Vec::new();
        assert!(rows.next().unwrap());
        assert!(matches!(rows.scan(&mut slots), Err(Error::Driver(_))));
    }

    #[test]
    fn test_fill_reports_column() {
        let mut slot = ScanSlot::new(String::from("age"), FieldType::new(ValueKind::I8));
        let err = slot.fill(SqlValue::Null).unwrap_err();
        assert!(matches!(err, Error::Scan { ref column, .. } if column == "age"));
    }
}
