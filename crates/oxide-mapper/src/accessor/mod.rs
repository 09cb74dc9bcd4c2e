//! Reading and writing record fields by logical name.
//!
//! Two strategies are provided. [`ReflectAccessor`] goes through the match
//! tables generated by `#[derive(Model)]`. [`UnsafeAccessor`] reads and
//! writes through the byte offsets recorded in the [`Schema`]. Both decode
//! the same row into the same record; [`AccessorKind`] selects one at
//! runtime.

mod reflect;
mod unsafe_accessor;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

pub use reflect::ReflectAccessor;
pub use unsafe_accessor::UnsafeAccessor;

use crate::error::{Error, Result};
use crate::executor::{Rows, ScanSlot};
use crate::model::{Model, Schema};
use crate::value::SqlValue;

/// Field access strategy.
pub trait ValueAccessor {
    /// Reads the field named `field` of `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] if the schema has no such field.
    fn read_field<T: Model>(&self, instance: &T, schema: &Schema, field: &str) -> Result<SqlValue>;

    /// Advances `rows` and decodes the current row into `instance`.
    ///
    /// Fields whose column is not part of the row are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRows`] when the cursor is exhausted,
    /// [`Error::TooManyColumns`] or [`Error::UnknownColumn`] when the row does
    /// not fit the schema, and [`Error::Scan`] when a value cannot be stored.
    fn decode_row<T: Model, R: Rows + ?Sized>(
        &self,
        rows: &mut R,
        instance: &mut T,
        schema: &Schema,
    ) -> Result<()>;
}

/// Selects a [`ValueAccessor`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessorKind {
    /// [`ReflectAccessor`].
    Reflect,
    /// [`UnsafeAccessor`].
    #[default]
    Unsafe,
}

impl AccessorKind {
    /// Returns the configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reflect => "reflect",
            Self::Unsafe => "unsafe",
        }
    }
}

impl fmt::Display for AccessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reflect" => Ok(Self::Reflect),
            "unsafe" => Ok(Self::Unsafe),
            other => Err(Error::Config(format!("unknown accessor: {other}"))),
        }
    }
}

impl ValueAccessor for AccessorKind {
    fn read_field<T: Model>(&self, instance: &T, schema: &Schema, field: &str) -> Result<SqlValue> {
        match self {
            Self::Reflect => ReflectAccessor.read_field(instance, schema, field),
            Self::Unsafe => UnsafeAccessor.read_field(instance, schema, field),
        }
    }

    fn decode_row<T: Model, R: Rows + ?Sized>(
        &self,
        rows: &mut R,
        instance: &mut T,
        schema: &Schema,
    ) -> Result<()> {
        trace!(accessor = self.as_str(), model = T::TYPE_NAME, "decoding row");
        match self {
            Self::Reflect => ReflectAccessor.decode_row(rows, instance, schema),
            Self::Unsafe => UnsafeAccessor.decode_row(rows, instance, schema),
        }
    }
}

/// Reads the current row into typed slots, one per result column.
///
/// The slots come back in column order; writing them into the record is left
/// to the strategy.
pub(crate) fn scan_row<R: Rows + ?Sized>(rows: &mut R, schema: &Schema) -> Result<Vec<ScanSlot>> {
    if !rows.next()? {
        return Err(Error::NoRows);
    }
    let columns = rows.columns()?;
    if columns.len() > schema.column_count() {
        return Err(Error::TooManyColumns);
    }

    let mut slots = columns
        .into_iter()
        .map(|column| {
            let field = schema
                .field_by_column(&column)
                .ok_or_else(|| Error::UnknownColumn(column.clone()))?;
            Ok(ScanSlot::new(column, field.ty))
        })
        .collect::<Result<Vec<_>>>()?;
    rows.scan(&mut slots)?;
    Ok(slots)
}
