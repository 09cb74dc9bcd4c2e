//! SQL values, conversions and field type descriptors.
//!
//! [`SqlValue`] is what travels to and from the database: every bound
//! argument is one, and every raw column value produced by a row cursor is
//! one. [`FieldType`] describes the Rust type of a mapped field so that a
//! correctly typed scan slot can be allocated before a row is read.

use std::fmt;

use thiserror::Error;

/// A SQL value that can be used as a parameter or read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns the name of the variant, used in conversion errors.
    #[must_use]
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOL",
            Self::Int(_) => "INT",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Blob(_) => "BLOB",
        }
    }

    /// Returns true for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// The scalar kind of a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    F32,
    F64,
    Text,
    Bytes,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Text => "String",
            Self::Bytes => "Vec<u8>",
        };
        f.write_str(name)
    }
}

/// Value type descriptor of a field: its scalar kind and whether it is
/// wrapped in `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldType {
    /// Scalar kind.
    pub kind: ValueKind,
    /// Whether the field is an `Option` of the kind.
    pub nullable: bool,
}

impl FieldType {
    /// Creates a non-nullable descriptor.
    #[must_use]
    pub const fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// Creates a nullable descriptor.
    #[must_use]
    pub const fn nullable(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    /// Converts a raw driver value into the canonical value for this type.
    ///
    /// Integer kinds become [`SqlValue::Int`] after a range check, float
    /// kinds [`SqlValue::Float`], and so on. Text holding a number is parsed,
    /// the way drivers hand back untyped column bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] when the raw value cannot represent this type.
    pub fn coerce(self, raw: SqlValue) -> Result<SqlValue, ValueError> {
        if raw.is_null() {
            return if self.nullable {
                Ok(SqlValue::Null)
            } else {
                Err(ValueError::UnexpectedNull(self.kind))
            };
        }
        let value = match self.kind {
            ValueKind::Bool => SqlValue::Bool(bool::from_sql_value(raw)?),
            ValueKind::I8 => SqlValue::Int(i64::from(i8::from_sql_value(raw)?)),
            ValueKind::I16 => SqlValue::Int(i64::from(i16::from_sql_value(raw)?)),
            ValueKind::I32 => SqlValue::Int(i64::from(i32::from_sql_value(raw)?)),
            ValueKind::I64 => SqlValue::Int(i64::from_sql_value(raw)?),
            ValueKind::U8 => SqlValue::Int(i64::from(u8::from_sql_value(raw)?)),
            ValueKind::U16 => SqlValue::Int(i64::from(u16::from_sql_value(raw)?)),
            ValueKind::U32 => SqlValue::Int(i64::from(u32::from_sql_value(raw)?)),
            ValueKind::F32 => SqlValue::Float(f64::from(f32::from_sql_value(raw)?)),
            ValueKind::F64 => SqlValue::Float(f64::from_sql_value(raw)?),
            ValueKind::Text => SqlValue::Text(String::from_sql_value(raw)?),
            ValueKind::Bytes => SqlValue::Blob(Vec::<u8>::from_sql_value(raw)?),
        };
        Ok(value)
    }
}

/// Failure converting a [`SqlValue`] into a Rust value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// NULL for a field that is not an `Option`.
    #[error("unexpected NULL for {0}")]
    UnexpectedNull(ValueKind),

    /// The value has a shape the target cannot hold.
    #[error("cannot convert {found} into {expected}")]
    Mismatch {
        /// Target kind.
        expected: ValueKind,
        /// Variant of the source value.
        found: &'static str,
    },

    /// The value does not fit into the target kind.
    #[error("{value} is out of range for {expected}")]
    OutOfRange {
        /// Target kind.
        expected: ValueKind,
        /// Offending value.
        value: String,
    },
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

/// Trait for types that can be read back from SQL values.
pub trait FromSqlValue: Sized {
    /// Converts a `SqlValue` into `Self`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] when the value cannot represent `Self`.
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError>;
}

mod private {
    pub trait Sealed {}
}

/// Maps a supported field type to its [`FieldType`] descriptor.
///
/// The set of implementations is closed: the offset-based accessor relies on
/// the descriptor matching the in-memory type exactly.
pub trait SqlType: private::Sealed + ToSqlValue + FromSqlValue + Clone {
    /// Descriptor for this type.
    const FIELD_TYPE: FieldType;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> Self {
        self
    }
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: Self) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! impl_to_sql_int {
    ($($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )+
    };
}

impl_to_sql_int!(i64, i32, i16, i8, u32, u16, u8);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        self.map_or(SqlValue::Null, ToSqlValue::to_sql_value)
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

fn text_of(value: SqlValue, expected: ValueKind) -> Result<String, ValueError> {
    match value {
        SqlValue::Text(s) => Ok(s),
        SqlValue::Blob(b) => String::from_utf8(b).map_err(|_| ValueError::Mismatch {
            expected,
            found: "BLOB",
        }),
        other => Err(ValueError::Mismatch {
            expected,
            found: other.variant_name(),
        }),
    }
}

fn integer_of(value: SqlValue, expected: ValueKind) -> Result<i64, ValueError> {
    match value {
        SqlValue::Null => Err(ValueError::UnexpectedNull(expected)),
        SqlValue::Int(n) => Ok(n),
        SqlValue::Bool(b) => Ok(i64::from(b)),
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss,
            clippy::float_cmp
        )]
        SqlValue::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(f as i64)
        }
        SqlValue::Float(f) => Err(ValueError::OutOfRange {
            expected,
            value: f.to_string(),
        }),
        other => {
            let text = text_of(other, expected)?;
            text.trim().parse().map_err(|_| ValueError::OutOfRange {
                expected,
                value: text,
            })
        }
    }
}

fn float_of(value: SqlValue, expected: ValueKind) -> Result<f64, ValueError> {
    match value {
        SqlValue::Null => Err(ValueError::UnexpectedNull(expected)),
        SqlValue::Float(f) => Ok(f),
        #[allow(clippy::cast_precision_loss)]
        SqlValue::Int(n) => Ok(n as f64),
        SqlValue::Bool(_) => Err(ValueError::Mismatch {
            expected,
            found: "BOOL",
        }),
        other => {
            let text = text_of(other, expected)?;
            text.trim().parse().map_err(|_| ValueError::Mismatch {
                expected,
                found: "TEXT",
            })
        }
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        integer_of(value, ValueKind::I64)
    }
}

macro_rules! impl_from_sql_narrow_int {
    ($($ty:ty => $kind:ident),+) => {
        $(
            impl FromSqlValue for $ty {
                fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
                    let n = integer_of(value, ValueKind::$kind)?;
                    <$ty>::try_from(n).map_err(|_| ValueError::OutOfRange {
                        expected: ValueKind::$kind,
                        value: n.to_string(),
                    })
                }
            }
        )+
    };
}

impl_from_sql_narrow_int!(i8 => I8, i16 => I16, i32 => I32, u8 => U8, u16 => U16, u32 => U32);

impl FromSqlValue for f64 {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        float_of(value, ValueKind::F64)
    }
}

impl FromSqlValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        float_of(value, ValueKind::F32).map(|f| f as f32)
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Null => Err(ValueError::UnexpectedNull(ValueKind::Bool)),
            SqlValue::Bool(b) => Ok(b),
            SqlValue::Int(n) => Ok(n != 0),
            SqlValue::Float(_) => Err(ValueError::Mismatch {
                expected: ValueKind::Bool,
                found: "FLOAT",
            }),
            other => {
                let text = text_of(other, ValueKind::Bool)?;
                match text.trim().to_ascii_lowercase().as_str() {
                    "1" | "t" | "true" => Ok(true),
                    "0" | "f" | "false" => Ok(false),
                    _ => Err(ValueError::OutOfRange {
                        expected: ValueKind::Bool,
                        value: text,
                    }),
                }
            }
        }
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Null => Err(ValueError::UnexpectedNull(ValueKind::Text)),
            SqlValue::Bool(b) => Ok(b.to_string()),
            SqlValue::Int(n) => Ok(n.to_string()),
            SqlValue::Float(f) => Ok(f.to_string()),
            other => text_of(other, ValueKind::Text),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Null => Err(ValueError::UnexpectedNull(ValueKind::Bytes)),
            SqlValue::Blob(b) => Ok(b),
            SqlValue::Text(s) => Ok(s.into_bytes()),
            other => Err(ValueError::Mismatch {
                expected: ValueKind::Bytes,
                found: other.variant_name(),
            }),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

macro_rules! impl_sql_type {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(
            impl private::Sealed for $ty {}
            impl private::Sealed for Option<$ty> {}

            impl SqlType for $ty {
                const FIELD_TYPE: FieldType = FieldType::new(ValueKind::$kind);
            }

            impl SqlType for Option<$ty> {
                const FIELD_TYPE: FieldType = FieldType::nullable(ValueKind::$kind);
            }
        )+
    };
}

impl_sql_type!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    f32 => F32,
    f64 => F64,
    String => Text,
    Vec<u8> => Bytes,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_sql_value_conversions() {
        assert_eq!(true.to_sql_value(), SqlValue::Bool(true));
        assert_eq!(42_i32.to_sql_value(), SqlValue::Int(42));
        assert_eq!(2.5_f64.to_sql_value(), SqlValue::Float(2.5));
        assert_eq!(
            "hello".to_sql_value(),
            SqlValue::Text(String::from("hello"))
        );
        assert_eq!(None::<i32>.to_sql_value(), SqlValue::Null);
        assert_eq!(Some(42_i32).to_sql_value(), SqlValue::Int(42));
    }

    #[test]
    fn test_integer_from_text_bytes() {
        // Drivers hand back untyped column bytes for text protocols.
        assert_eq!(i64::from_sql_value(SqlValue::Blob(b"123".to_vec())), Ok(123));
        assert_eq!(i8::from_sql_value(SqlValue::Text(String::from(" 18 "))), Ok(18));
    }

    #[test]
    fn test_narrow_integer_out_of_range() {
        assert_eq!(
            i8::from_sql_value(SqlValue::Int(300)),
            Err(ValueError::OutOfRange {
                expected: ValueKind::I8,
                value: String::from("300"),
            })
        );
        assert!(u32::from_sql_value(SqlValue::Int(-1)).is_err());
    }

    #[test]
    fn test_integer_from_float() {
        assert_eq!(i64::from_sql_value(SqlValue::Float(42.0)), Ok(42));
        assert!(i64::from_sql_value(SqlValue::Float(1.5)).is_err());
        // 2^63 is one past i64::MAX and must not saturate.
        assert_eq!(
            i64::from_sql_value(SqlValue::Float(9_223_372_036_854_775_808.0)),
            Err(ValueError::OutOfRange {
                expected: ValueKind::I64,
                value: String::from("9223372036854775808"),
            })
        );
        assert_eq!(
            i64::from_sql_value(SqlValue::Float(-9_223_372_036_854_775_808.0)),
            Ok(i64::MIN)
        );
    }

    #[test]
    fn test_null_handling() {
        assert_eq!(
            String::from_sql_value(SqlValue::Null),
            Err(ValueError::UnexpectedNull(ValueKind::Text))
        );
        assert_eq!(Option::<String>::from_sql_value(SqlValue::Null), Ok(None));
    }

    #[test]
    fn test_bool_from_text() {
        assert_eq!(bool::from_sql_value(SqlValue::Text(String::from("TRUE"))), Ok(true));
        assert_eq!(bool::from_sql_value(SqlValue::Int(0)), Ok(false));
        assert!(bool::from_sql_value(SqlValue::Text(String::from("maybe"))).is_err());
    }

    #[test]
    fn test_coerce_canonicalizes() {
        let ty = FieldType::new(ValueKind::I8);
        assert_eq!(ty.coerce(SqlValue::Text(String::from("18"))), Ok(SqlValue::Int(18)));
        assert_eq!(
            FieldType::new(ValueKind::Text).coerce(SqlValue::Blob(b"long".to_vec())),
            Ok(SqlValue::Text(String::from("long")))
        );
        assert_eq!(
            FieldType::nullable(ValueKind::Text).coerce(SqlValue::Null),
            Ok(SqlValue::Null)
        );
        assert_eq!(
            ty.coerce(SqlValue::Null),
            Err(ValueError::UnexpectedNull(ValueKind::I8))
        );
    }

    #[test]
    fn test_field_type_descriptors() {
        assert_eq!(<i64 as SqlType>::FIELD_TYPE, FieldType::new(ValueKind::I64));
        assert_eq!(
            <Option<String> as SqlType>::FIELD_TYPE,
            FieldType::nullable(ValueKind::Text)
        );
    }
}
