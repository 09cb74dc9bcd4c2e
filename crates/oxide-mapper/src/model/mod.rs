//! Record shapes, derived schemas and the model registry.
//!
//! A record type describes itself through the [`Model`] trait, normally
//! implemented with `#[derive(Model)]`:
//!
//! ```rust,ignore
//! use oxide_mapper::Model;
//!
//! #[derive(Default, Model)]
//! #[table(name = "people")]
//! struct Person {
//!     id: i64,
//!     #[column(name = "given_name")]
//!     first_name: String,
//!     age: Option<i32>,
//! }
//! ```
//!
//! The [`Registry`] turns that description into a [`Schema`] once per type and
//! hands out the cached copy afterwards.

mod registry;

use std::any::TypeId;
use std::collections::HashMap;

pub use registry::{underscore_name, ModelOption, Registry};

use crate::error::{self, Error};
use crate::value::{FieldType, SqlValue, ValueError};

/// Static description of one field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Logical field name, as written in the struct.
    pub name: &'static str,
    /// Explicit column name from `#[column(name = "...")]`.
    pub column: Option<&'static str>,
    /// Value type of the field.
    pub ty: FieldType,
    /// Byte offset of the field inside the struct.
    pub offset: usize,
}

/// A record type that can be mapped to a table.
///
/// # Safety
///
/// Every entry of [`Model::FIELDS`] must describe a field of `Self`: `offset`
/// must be the byte offset of that field and `ty` must be the
/// [`FieldType`] of its exact Rust type. The offset-based accessor reads and
/// writes through these offsets. `#[derive(Model)]` upholds this contract;
/// hand-written implementations must as well.
// The trait only declares the contract; all offset arithmetic lives in
// `accessor::unsafe_accessor`.
#[allow(unsafe_code)]
pub unsafe trait Model: 'static {
    /// Name of the Rust type.
    const TYPE_NAME: &'static str;

    /// Table name override from `#[table(name = "...")]`.
    const TABLE_NAME: Option<&'static str> = None;

    /// Fields in declaration order.
    const FIELDS: &'static [FieldDef];

    /// Reads a field by logical name. `None` if the type has no such field.
    fn field_value(&self, field: &str) -> Option<SqlValue>;

    /// Writes a field by logical name.
    ///
    /// Returns `Ok(false)` if the type has no such field.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] when the value cannot be stored in the field.
    fn set_field_value(&mut self, field: &str, value: SqlValue) -> Result<bool, ValueError>;

    /// Returns the type-erased shape of this record type.
    #[must_use]
    fn shape() -> Shape
    where
        Self: Sized,
    {
        Shape::of::<Self>()
    }
}

/// What kind of type a [`Shape`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// A struct with named fields.
    Record,
    /// Anything else: scalars, tuples, references.
    Opaque,
}

/// Type-erased description of a type, used by the registry.
///
/// Shapes can only be obtained through [`Shape::of`] or [`Shape::opaque`], so
/// the field table of a record shape always belongs to its `TypeId`.
#[derive(Debug, Clone)]
pub struct Shape {
    type_id: TypeId,
    type_name: &'static str,
    kind: ShapeKind,
    table_name: Option<&'static str>,
    fields: &'static [FieldDef],
}

impl Shape {
    /// Shape of a mapped record type.
    #[must_use]
    pub fn of<T: Model>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: T::TYPE_NAME,
            kind: ShapeKind::Record,
            table_name: T::TABLE_NAME,
            fields: T::FIELDS,
        }
    }

    /// Shape of a type that is not a mapped record.
    #[must_use]
    pub fn opaque<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            kind: ShapeKind::Opaque,
            table_name: None,
            fields: &[],
        }
    }

    /// Returns the `TypeId` of the described type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the shape kind.
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Returns the table name override, if any.
    #[must_use]
    pub const fn table_name(&self) -> Option<&'static str> {
        self.table_name
    }

    /// Returns the field table.
    #[must_use]
    pub const fn fields(&self) -> &'static [FieldDef] {
        self.fields
    }
}

/// A mapped field of a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Logical field name.
    pub name: &'static str,
    /// Physical column name.
    pub column: String,
    /// Value type of the field.
    pub ty: FieldType,
    /// Byte offset of the field inside the struct.
    pub offset: usize,
}

/// Column mapping derived from a record shape.
#[derive(Debug, Clone)]
pub struct Schema {
    type_id: TypeId,
    type_name: &'static str,
    table_name: String,
    fields: Vec<Field>,
    field_map: HashMap<&'static str, usize>,
    column_map: HashMap<String, usize>,
}

impl Schema {
    pub(crate) fn from_shape(shape: &Shape) -> error::Result<Self> {
        let fields: Vec<Field> = shape
            .fields
            .iter()
            .map(|def| Field {
                name: def.name,
                column: def
                    .column
                    .filter(|column| !column.is_empty())
                    .map_or_else(|| underscore_name(def.name), String::from),
                ty: def.ty,
                offset: def.offset,
            })
            .collect();
        let table_name = shape
            .table_name
            .map_or_else(|| underscore_name(shape.type_name), String::from);

        let mut schema = Self {
            type_id: shape.type_id,
            type_name: shape.type_name,
            table_name,
            field_map: fields
                .iter()
                .enumerate()
                .map(|(i, f)| (f.name, i))
                .collect(),
            column_map: HashMap::new(),
            fields,
        };
        schema.reindex_columns()?;
        Ok(schema)
    }

    /// Rebuilds the column index. Every field must own a distinct column.
    pub(crate) fn reindex_columns(&mut self) -> error::Result<()> {
        let mut column_map = HashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if column_map.insert(field.column.clone(), i).is_some() {
                return Err(Error::DuplicateColumn(field.column.clone()));
            }
        }
        self.column_map = column_map;
        Ok(())
    }

    pub(crate) fn set_table_name(&mut self, name: String) {
        self.table_name = name;
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        let index = *self.field_map.get(name)?;
        self.fields.get_mut(index)
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by logical name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.field_map.get(name).map(|&i| &self.fields[i])
    }

    /// Looks up a field by physical column name.
    #[must_use]
    pub fn field_by_column(&self, column: &str) -> Option<&Field> {
        self.column_map.get(column).map(|&i| &self.fields[i])
    }

    /// Returns the number of mapped columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_map.len()
    }

    /// Returns the `TypeId` of the record type this schema was derived from.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the name of the record type this schema was derived from.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}
