use super::{scan_row, ValueAccessor};
use crate::error::{Error, Result};
use crate::executor::Rows;
use crate::model::{Model, Schema};
use crate::value::SqlValue;

/// Accesses fields through the match tables generated for each [`Model`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectAccessor;

impl ValueAccessor for ReflectAccessor {
    fn read_field<T: Model>(&self, instance: &T, schema: &Schema, field: &str) -> Result<SqlValue> {
        if schema.field(field).is_none() {
            return Err(Error::UnknownField(field.to_string()));
        }
        instance
            .field_value(field)
            .ok_or_else(|| Error::UnknownField(field.to_string()))
    }

    fn decode_row<T: Model, R: Rows + ?Sized>(
        &self,
        rows: &mut R,
        instance: &mut T,
        schema: &Schema,
    ) -> Result<()> {
        for slot in scan_row(rows, schema)? {
            let (column, value) = slot.into_parts();
            let Some(field) = schema.field_by_column(&column) else {
                return Err(Error::UnknownColumn(column));
            };
            match instance.set_field_value(field.name, value) {
                Ok(true) => {}
                Ok(false) => return Err(Error::UnknownField(field.name.to_string())),
                Err(source) => return Err(Error::Scan { column, source }),
            }
        }
        Ok(())
    }
}
