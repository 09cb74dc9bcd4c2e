//! Error types for schema derivation, statement building and row decoding.

use thiserror::Error;

use crate::value::ValueError;

/// Errors produced while mapping records or building statements.
///
/// Everything except [`Error::Driver`] is a local, synchronous failure that
/// points at how a statement was constructed or at a schema/row mismatch.
#[derive(Debug, Error)]
pub enum Error {
    /// No record shape was supplied.
    #[error("record shape is missing")]
    InputNil,

    /// The shape does not describe a record with named fields.
    #[error("only record types with named fields can be mapped")]
    PointerOnly,

    /// A table name override was empty.
    #[error("table name must not be empty")]
    EmptyTableName,

    /// Two fields map to the same column.
    #[error("column {0} is mapped by more than one field")]
    DuplicateColumn(String),

    /// The field is not part of the schema.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A result column has no matching field.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// The row has more columns than the schema maps.
    #[error("row has more columns than the model defines")]
    TooManyColumns,

    /// The row cursor is exhausted.
    #[error("no rows in result set")]
    NoRows,

    /// An insert was built without any record.
    #[error("insert requires at least one record")]
    InsertZeroRow,

    /// A SET clause entry is not a `column = value` assignment.
    #[error("unsupported operator in assignment")]
    UnsupportedOperator,

    /// The expression kind cannot appear at this position.
    #[error("unsupported expression")]
    UnsupportedExpression,

    /// A raw column value could not be stored in its field.
    #[error("cannot scan column {column}: {source}")]
    Scan {
        /// Column being scanned.
        column: String,
        /// Conversion failure.
        #[source]
        source: ValueError,
    },

    /// A schema derived for one type was used with a record of another.
    #[error("schema for {expected} used with a record of type {found}")]
    SchemaMismatch {
        /// Type the schema was derived from.
        expected: &'static str,
        /// Type of the record being accessed.
        found: &'static str,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failure reported by the database collaborator.
    #[error("database error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an executor or driver failure.
    pub fn driver(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Driver(err.into())
    }
}

/// Result type alias for mapper operations.
pub type Result<T> = std::result::Result<T, Error>;
