//! The enumerated column-value sum type (spec §4.3 design note: replace
//! reflection/dynamic dispatch over Arrow vector types with a closed sum
//! type over supported column kinds). Anything outside this set fails
//! explicitly rather than silently degrading to a string.

use arrow::array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Date32Array, Decimal128Array, Float32Array,
    Float64Array, Int32Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::DataType;
use std::cmp::Ordering;

use crate::storage::StorageError;

/// A single scalar value from one of the column kinds the engine
/// understands (spec §4.3).
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Utf8(String),
    Binary(Vec<u8>),
    Bool(bool),
    Date32(i32),
    TimestampMicros(i64),
    TimestampMicrosTz(i64),
    Decimal128(i128),
}

impl Eq for ColumnValue {}

impl std::hash::Hash for ColumnValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            ColumnValue::Int32(v) => v.hash(state),
            ColumnValue::Int64(v) => v.hash(state),
            // Floats hash bitwise; this matches `PartialEq`'s `==`, which
            // for this enum is plain `f32`/`f64` equality (NaN != NaN,
            // but NaN never recurs as a literal join/filter key here).
            ColumnValue::Float32(v) => v.to_bits().hash(state),
            ColumnValue::Float64(v) => v.to_bits().hash(state),
            ColumnValue::Utf8(v) => v.hash(state),
            ColumnValue::Binary(v) => v.hash(state),
            ColumnValue::Bool(v) => v.hash(state),
            ColumnValue::Date32(v) => v.hash(state),
            ColumnValue::TimestampMicros(v) => v.hash(state),
            ColumnValue::TimestampMicrosTz(v) => v.hash(state),
            ColumnValue::Decimal128(v) => v.hash(state),
        }
    }
}

impl ColumnValue {
    /// Read the value at `row` out of a typed Arrow array. Errors on a
    /// column kind outside the enumerated set.
    pub fn from_array(array: &ArrayRef, row: usize) -> Result<ColumnValue, StorageError> {
        match array.data_type() {
            DataType::Int32 => {
                let a = array.as_any().downcast_ref::<Int32Array>().unwrap();
                Ok(ColumnValue::Int32(a.value(row)))
            }
            DataType::Int64 => {
                let a = array.as_any().downcast_ref::<Int64Array>().unwrap();
                Ok(ColumnValue::Int64(a.value(row)))
            }
            DataType::Float32 => {
                let a = array.as_any().downcast_ref::<Float32Array>().unwrap();
                Ok(ColumnValue::Float32(a.value(row)))
            }
            DataType::Float64 => {
                let a = array.as_any().downcast_ref::<Float64Array>().unwrap();
                Ok(ColumnValue::Float64(a.value(row)))
            }
            DataType::Utf8 => {
                let a = array.as_any().downcast_ref::<StringArray>().unwrap();
                Ok(ColumnValue::Utf8(a.value(row).to_string()))
            }
            DataType::Binary => {
                let a = array.as_any().downcast_ref::<BinaryArray>().unwrap();
                Ok(ColumnValue::Binary(a.value(row).to_vec()))
            }
            DataType::Boolean => {
                let a = array.as_any().downcast_ref::<BooleanArray>().unwrap();
                Ok(ColumnValue::Bool(a.value(row)))
            }
            DataType::Date32 => {
                let a = array.as_any().downcast_ref::<Date32Array>().unwrap();
                Ok(ColumnValue::Date32(a.value(row)))
            }
            DataType::Timestamp(arrow::datatypes::TimeUnit::Microsecond, tz) => {
                let a = array
                    .as_any()
                    .downcast_ref::<TimestampMicrosecondArray>()
                    .unwrap();
                Ok(if tz.is_some() {
                    ColumnValue::TimestampMicrosTz(a.value(row))
                } else {
                    ColumnValue::TimestampMicros(a.value(row))
                })
            }
            DataType::Decimal128(_, _) => {
                let a = array.as_any().downcast_ref::<Decimal128Array>().unwrap();
                Ok(ColumnValue::Decimal128(a.value(row)))
            }
            other => Err(StorageError::Arrow(arrow::error::ArrowError::SchemaError(
                format!("unsupported column type: {other:?}"),
            ))),
        }
    }

    /// Ordering between two values of (expected) matching variants. `None`
    /// if the variants differ or the comparison is undefined (NaN).
    pub fn partial_cmp_value(&self, other: &ColumnValue) -> Option<Ordering> {
        match (self, other) {
            (ColumnValue::Int32(a), ColumnValue::Int32(b)) => a.partial_cmp(b),
            (ColumnValue::Int64(a), ColumnValue::Int64(b)) => a.partial_cmp(b),
            (ColumnValue::Float32(a), ColumnValue::Float32(b)) => a.partial_cmp(b),
            (ColumnValue::Float64(a), ColumnValue::Float64(b)) => a.partial_cmp(b),
            (ColumnValue::Utf8(a), ColumnValue::Utf8(b)) => a.partial_cmp(b),
            (ColumnValue::Binary(a), ColumnValue::Binary(b)) => a.partial_cmp(b),
            (ColumnValue::Bool(a), ColumnValue::Bool(b)) => a.partial_cmp(b),
            (ColumnValue::Date32(a), ColumnValue::Date32(b)) => a.partial_cmp(b),
            (ColumnValue::TimestampMicros(a), ColumnValue::TimestampMicros(b)) => a.partial_cmp(b),
            (ColumnValue::TimestampMicrosTz(a), ColumnValue::TimestampMicrosTz(b)) => {
                a.partial_cmp(b)
            }
            (ColumnValue::Decimal128(a), ColumnValue::Decimal128(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn reads_int32_column() {
        let array: ArrayRef = Arc::new(Int32Array::from(vec![10, 20, 30]));
        assert_eq!(ColumnValue::from_array(&array, 1).unwrap(), ColumnValue::Int32(20));
    }

    #[test]
    fn unsupported_type_errors() {
        let array: ArrayRef = Arc::new(arrow::array::UInt8Array::from(vec![1u8]));
        assert!(ColumnValue::from_array(&array, 0).is_err());
    }

    #[test]
    fn cross_variant_ordering_is_none() {
        let a = ColumnValue::Int32(1);
        let b = ColumnValue::Utf8("1".to_string());
        assert_eq!(a.partial_cmp_value(&b), None);
    }
}
