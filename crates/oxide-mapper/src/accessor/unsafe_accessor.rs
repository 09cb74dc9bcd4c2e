//! Offset-based field access.
//!
//! This is the only module of the crate that uses `unsafe`. Every pointer it
//! builds is `record base + Field::offset` for a schema whose `TypeId` was
//! checked against the record type first, and the value type used for the
//! access comes from the same [`FieldType`] that `#[derive(Model)]` recorded
//! for the field.
#![allow(unsafe_code)]

use std::any::TypeId;
use std::ptr;

use super::{scan_row, ValueAccessor};
use crate::error::{Error, Result};
use crate::executor::Rows;
use crate::model::{Field, Model, Schema};
use crate::value::{FieldType, FromSqlValue, SqlValue, ToSqlValue, ValueError, ValueKind};

/// Expands `$body` once per supported field type, with `$v` bound to the
/// concrete Rust type described by `$ty`.
macro_rules! with_field_type {
    ($ty:expr, $v:ident => $body:expr) => {{
        let ty: FieldType = $ty;
        with_field_type!(@arms ty, $v, $body;
            Bool => bool,
            I8 => i8,
            I16 => i16,
            I32 => i32,
            I64 => i64,
            U8 => u8,
            U16 => u16,
            U32 => u32,
            F32 => f32,
            F64 => f64,
            Text => String,
            Bytes => Vec<u8>
        )
    }};
    (@arms $ty:ident, $v:ident, $body:expr; $($kind:ident => $base:ty),+) => {
        match ($ty.kind, $ty.nullable) {
            $(
                (ValueKind::$kind, false) => {
                    type $v = $base;
                    $body
                }
                (ValueKind::$kind, true) => {
                    type $v = Option<$base>;
                    $body
                }
            )+
        }
    };
}

/// Accesses fields through their byte offsets.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsafeAccessor;

impl ValueAccessor for UnsafeAccessor {
    fn read_field<T: Model>(&self, instance: &T, schema: &Schema, field: &str) -> Result<SqlValue> {
        check_schema::<T>(schema)?;
        let field = schema
            .field(field)
            .ok_or_else(|| Error::UnknownField(field.to_string()))?;
        let base = ptr::from_ref(instance).cast::<u8>();
        // SAFETY: the schema was derived from `T`, so `field` describes a
        // field of `T` at `field.offset` with type `field.ty`.
        Ok(unsafe { read_at(base, field) })
    }

    fn decode_row<T: Model, R: Rows + ?Sized>(
        &self,
        rows: &mut R,
        instance: &mut T,
        schema: &Schema,
    ) -> Result<()> {
        check_schema::<T>(schema)?;
        let slots = scan_row(rows, schema)?;
        let base = ptr::from_mut(instance).cast::<u8>();
        for slot in slots {
            let (column, value) = slot.into_parts();
            let Some(field) = schema.field_by_column(&column) else {
                return Err(Error::UnknownColumn(column));
            };
            // SAFETY: same argument as in `read_field`; `base` comes from an
            // exclusive borrow of the record.
            let stored = unsafe { write_at(base, field, value) };
            stored.map_err(|source| Error::Scan { column, source })?;
        }
        Ok(())
    }
}

fn check_schema<T: Model>(schema: &Schema) -> Result<()> {
    if schema.type_id() == TypeId::of::<T>() {
        Ok(())
    } else {
        Err(Error::SchemaMismatch {
            expected: schema.type_name(),
            found: T::TYPE_NAME,
        })
    }
}

/// # Safety
///
/// `base` must point to a live record whose field at `field.offset` has the
/// type described by `field.ty`.
unsafe fn read_at(base: *const u8, field: &Field) -> SqlValue {
    with_field_type!(field.ty, V => unsafe { load::<V>(base, field.offset) })
}

/// # Safety
///
/// As for [`read_at`], and `base` must be valid for writes.
unsafe fn write_at(
    base: *mut u8,
    field: &Field,
    value: SqlValue,
) -> std::result::Result<(), ValueError> {
    with_field_type!(field.ty, V => unsafe { store::<V>(base, field.offset, value) })
}

unsafe fn load<V: ToSqlValue + Clone>(base: *const u8, offset: usize) -> SqlValue {
    // SAFETY: the caller guarantees an initialized, aligned `V` at
    // `base + offset`.
    let value = unsafe { &*base.add(offset).cast::<V>() };
    value.clone().to_sql_value()
}

unsafe fn store<V: FromSqlValue>(
    base: *mut u8,
    offset: usize,
    value: SqlValue,
) -> std::result::Result<(), ValueError> {
    let value = V::from_sql_value(value)?;
    // SAFETY: the caller guarantees an initialized, aligned `V` at
    // `base + offset`; assigning drops the previous value.
    unsafe {
        *base.add(offset).cast::<V>() = value;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::BufferedRows;
    use crate::model::{ModelOption, Registry};

    #[derive(Debug, Default, Clone, PartialEq, oxide_mapper::Model)]
    struct Sample {
        flag: bool,
        small: i8,
        medium: u16,
        ratio: f32,
        name: String,
        data: Vec<u8>,
        note: Option<String>,
        score: Option<f64>,
    }

    #[derive(Debug, Default, oxide_mapper::Model)]
    struct Other {
        id: i64,
    }

    fn sample() -> Sample {
        Sample {
            flag: true,
            small: -3,
            medium: 512,
            ratio: 0.5,
            name: String::from("Tom"),
            data: vec![1, 2, 3],
            note: None,
            score: Some(9.5),
        }
    }

    #[test]
    fn test_read_every_kind() {
        let schema = Registry::new().get::<Sample>().unwrap();
        let record = sample();

        let read = |name| UnsafeAccessor.read_field(&record, &schema, name).unwrap();
        assert_eq!(read("flag"), SqlValue::Bool(true));
        assert_eq!(read("small"), SqlValue::Int(-3));
        assert_eq!(read("medium"), SqlValue::Int(512));
        assert_eq!(read("ratio"), SqlValue::Float(0.5));
        assert_eq!(read("name"), SqlValue::Text(String::from("Tom")));
        assert_eq!(read("data"), SqlValue::Blob(vec![1, 2, 3]));
        assert_eq!(read("note"), SqlValue::Null);
        assert_eq!(read("score"), SqlValue::Float(9.5));
    }

    #[test]
    fn test_decode_matches_reflect() {
        let schema = Registry::new().get::<Sample>().unwrap();
        let columns = ["flag", "small", "medium", "ratio", "name", "data", "note", "score"];
        let row = vec![
            SqlValue::Int(1),
            SqlValue::Text(String::from("-3")),
            SqlValue::Int(512),
            SqlValue::Float(0.5),
            SqlValue::Blob(b"Tom".to_vec()),
            SqlValue::Blob(vec![1, 2, 3]),
            SqlValue::Null,
            SqlValue::Text(String::from("9.5")),
        ];

        let mut by_offset = Sample::default();
        let mut rows = BufferedRows::new(columns).add_row(row.clone());
        UnsafeAccessor
            .decode_row(&mut rows, &mut by_offset, &schema)
            .unwrap();

        let mut by_name = Sample::default();
        let mut rows = BufferedRows::new(columns).add_row(row);
        crate::accessor::ReflectAccessor
            .decode_row(&mut rows, &mut by_name, &schema)
            .unwrap();

        assert_eq!(by_offset, sample());
        assert_eq!(by_offset, by_name);
    }

    #[test]
    fn test_decode_replaces_owned_values() {
        let schema = Registry::new().get::<Sample>().unwrap();
        let mut record = sample();
        let mut rows = BufferedRows::new(["name", "note"]).add_row(vec![
            SqlValue::Text(String::from("Jerry")),
            SqlValue::Text(String::from("cat")),
        ]);

        UnsafeAccessor.decode_row(&mut rows, &mut record, &schema).unwrap();

        assert_eq!(record.name, "Jerry");
        assert_eq!(record.note.as_deref(), Some("cat"));
        assert_eq!(record.data, vec![1, 2, 3]);
    }

    #[test]
    fn test_schema_of_other_type_is_rejected() {
        let registry = Registry::new();
        let other = registry.get::<Other>().unwrap();
        let record = sample();

        assert!(matches!(
            UnsafeAccessor.read_field(&record, &other, "id"),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_renamed_column_keeps_offset() {
        let registry = Registry::new();
        let schema = registry
            .register::<Other, _>([ModelOption::column_name("id", "other_id")])
            .unwrap();
        let mut record = Other::default();
        let mut rows = BufferedRows::new(["other_id"]).add_row(vec![SqlValue::Int(7)]);

        UnsafeAccessor.decode_row(&mut rows, &mut record, &schema).unwrap();

        assert_eq!(record.id, 7);
    }

    #[test]
    fn test_unconvertible_value() {
        let schema = Registry::new().get::<Sample>().unwrap();
        let mut record = Sample::default();
        let mut rows =
            BufferedRows::new(["small"]).add_row(vec![SqlValue::Text(String::from("abc"))]);

        let err = UnsafeAccessor
            .decode_row(&mut rows, &mut record, &schema)
            .unwrap_err();

        assert!(matches!(err, Error::Scan { ref column, .. } if column == "small"));
    }
}
