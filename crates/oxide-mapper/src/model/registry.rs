use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::{Model, Schema, Shape, ShapeKind};
use crate::error::{Error, Result};

/// Caches one [`Schema`] per record type.
///
/// Lookups take a read lock; schemas are derived outside the lock and the
/// first one inserted for a type wins, so concurrent callers always share the
/// same `Arc`.
#[derive(Debug, Default)]
pub struct Registry {
    models: RwLock<HashMap<TypeId, Arc<Schema>>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the schema of `T`, deriving and caching it on first use.
    ///
    /// # Errors
    ///
    /// Fails if the schema cannot be derived.
    pub fn get<T: Model>(&self) -> Result<Arc<Schema>> {
        self.get_shape(Some(&Shape::of::<T>()))
    }

    /// Derives the schema of `T`, applies `options` in order and stores the
    /// result, replacing any cached schema for `T`.
    ///
    /// # Errors
    ///
    /// Fails with the first option error.
    pub fn register<T, I>(&self, options: I) -> Result<Arc<Schema>>
    where
        T: Model,
        I: IntoIterator<Item = ModelOption>,
    {
        self.register_shape(Some(&Shape::of::<T>()), options)
    }

    /// Type-erased form of [`Registry::get`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputNil`] when `shape` is `None` and
    /// [`Error::PointerOnly`] when it does not describe a record.
    pub fn get_shape(&self, shape: Option<&Shape>) -> Result<Arc<Schema>> {
        let shape = check_shape(shape)?;
        let cached = self.read().get(&shape.type_id()).cloned();
        if let Some(schema) = cached {
            return Ok(schema);
        }

        let schema = Arc::new(Schema::from_shape(shape)?);
        debug!(
            model = shape.type_name(),
            table = schema.table_name(),
            columns = schema.column_count(),
            "derived schema"
        );
        let cached = Arc::clone(self.write().entry(shape.type_id()).or_insert(schema));
        Ok(cached)
    }

    /// Type-erased form of [`Registry::register`].
    ///
    /// # Errors
    ///
    /// Same as [`Registry::get_shape`], plus the first option error.
    pub fn register_shape<I>(&self, shape: Option<&Shape>, options: I) -> Result<Arc<Schema>>
    where
        I: IntoIterator<Item = ModelOption>,
    {
        let shape = check_shape(shape)?;
        let mut schema = Schema::from_shape(shape)?;
        for option in options {
            option.apply(&mut schema)?;
        }
        schema.reindex_columns()?;

        let schema = Arc::new(schema);
        debug!(
            model = shape.type_name(),
            table = schema.table_name(),
            columns = schema.column_count(),
            "registered schema"
        );
        self.write().insert(shape.type_id(), Arc::clone(&schema));
        Ok(schema)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TypeId, Arc<Schema>>> {
        self.models.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<TypeId, Arc<Schema>>> {
        self.models.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn check_shape(shape: Option<&Shape>) -> Result<&Shape> {
    let shape = shape.ok_or(Error::InputNil)?;
    if shape.kind() != ShapeKind::Record {
        return Err(Error::PointerOnly);
    }
    Ok(shape)
}

/// A configuration step applied by [`Registry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOption {
    /// Overrides the table name.
    TableName(String),
    /// Overrides the column name of a field. An empty name restores the
    /// derived one.
    ColumnName {
        /// Logical field name.
        field: String,
        /// New column name.
        column: String,
    },
}

impl ModelOption {
    /// Option overriding the table name.
    #[must_use]
    pub fn table_name(name: impl Into<String>) -> Self {
        Self::TableName(name.into())
    }

    /// Option overriding the column name of `field`.
    #[must_use]
    pub fn column_name(field: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnName {
            field: field.into(),
            column: column.into(),
        }
    }

    fn apply(self, schema: &mut Schema) -> Result<()> {
        match self {
            Self::TableName(name) => {
                if name.is_empty() {
                    return Err(Error::EmptyTableName);
                }
                schema.set_table_name(name);
            }
            Self::ColumnName { field, column } => {
                let target = schema
                    .field_mut(&field)
                    .ok_or_else(|| Error::UnknownField(field.clone()))?;
                target.column = if column.is_empty() {
                    underscore_name(target.name)
                } else {
                    column
                };
            }
        }
        Ok(())
    }
}

/// Converts a `CamelCase` identifier to `snake_case`.
///
/// Every uppercase letter after the first character gets a `_` in front of
/// it, so acronyms are split letter by letter: `ID` becomes `i_d`.
#[must_use]
pub fn underscore_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
