//! The engine's own `Schema` representation (spec §3.1), translated from
//! Iceberg table metadata rather than consumed directly so the rest of
//! the engine never depends on the `iceberg` crate's types.

use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use std::sync::Arc;

/// A column's logical type, restricted to the set `arrow_util` knows how
/// to evaluate predicates and copy rows for (spec §9 design note).
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalType {
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
    Binary,
    Bool,
    Date32,
    TimestampMicros,
    TimestampMicrosTz,
    Decimal128 { precision: u8, scale: i8 },
}

impl LogicalType {
    pub fn to_arrow(&self) -> DataType {
        match self {
            LogicalType::Int32 => DataType::Int32,
            LogicalType::Int64 => DataType::Int64,
            LogicalType::Float32 => DataType::Float32,
            LogicalType::Float64 => DataType::Float64,
            LogicalType::Utf8 => DataType::Utf8,
            LogicalType::Binary => DataType::Binary,
            LogicalType::Bool => DataType::Boolean,
            LogicalType::Date32 => DataType::Date32,
            LogicalType::TimestampMicros => {
                DataType::Timestamp(arrow::datatypes::TimeUnit::Microsecond, None)
            }
            LogicalType::TimestampMicrosTz => DataType::Timestamp(
                arrow::datatypes::TimeUnit::Microsecond,
                Some(Arc::from("UTC")),
            ),
            LogicalType::Decimal128 { precision, scale } => {
                DataType::Decimal128(*precision, *scale)
            }
        }
    }

    /// Best-effort mapping from an Arrow `DataType` back to our enumerated
    /// set. `None` for anything unsupported (spec §9: "fails explicitly").
    pub fn from_arrow(data_type: &DataType) -> Option<LogicalType> {
        match data_type {
            DataType::Int32 => Some(LogicalType::Int32),
            DataType::Int64 => Some(LogicalType::Int64),
            DataType::Float32 => Some(LogicalType::Float32),
            DataType::Float64 => Some(LogicalType::Float64),
            DataType::Utf8 => Some(LogicalType::Utf8),
            DataType::Binary => Some(LogicalType::Binary),
            DataType::Boolean => Some(LogicalType::Bool),
            DataType::Date32 => Some(LogicalType::Date32),
            DataType::Timestamp(arrow::datatypes::TimeUnit::Microsecond, None) => {
                Some(LogicalType::TimestampMicros)
            }
            DataType::Timestamp(arrow::datatypes::TimeUnit::Microsecond, Some(_)) => {
                Some(LogicalType::TimestampMicrosTz)
            }
            DataType::Decimal128(precision, scale) => Some(LogicalType::Decimal128 {
                precision: *precision,
                scale: *scale,
            }),
            _ => None,
        }
    }
}

/// One column in a [`Schema`] (spec §3.1).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub logical_type: LogicalType,
    pub nullable: bool,
    pub is_partition_key: bool,
}

/// A partition-spec entry: which source field feeds which partition
/// column, and by what transform (identity, bucket, truncate, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionField {
    pub source_field_id: i32,
    pub field_name: String,
    pub transform: String,
}

/// A resolved table schema plus its partition spec (spec §3.1 "Schema").
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub fields: Vec<FieldSchema>,
    pub partition_spec: Vec<PartitionField>,
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn partition_field_names(&self) -> Vec<&str> {
        self.partition_spec
            .iter()
            .map(|p| p.field_name.as_str())
            .collect()
    }

    /// Build an Arrow schema over a column subset (for scan projection);
    /// `None` subset means every column.
    pub fn to_arrow(&self, columns: Option<&[String]>) -> ArrowSchema {
        let fields: Vec<Field> = match columns {
            Some(columns) => columns
                .iter()
                .filter_map(|name| self.field(name))
                .map(field_to_arrow)
                .collect(),
            None => self.fields.iter().map(field_to_arrow).collect(),
        };
        ArrowSchema::new(fields)
    }
}

fn field_to_arrow(field: &FieldSchema) -> Field {
    Field::new(&field.name, field.logical_type.to_arrow(), field.nullable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_round_trip_preserves_supported_types() {
        for lt in [
            LogicalType::Int32,
            LogicalType::Int64,
            LogicalType::Utf8,
            LogicalType::Bool,
            LogicalType::Date32,
            LogicalType::TimestampMicros,
            LogicalType::Decimal128 { precision: 10, scale: 2 },
        ] {
            let arrow_ty = lt.to_arrow();
            assert_eq!(LogicalType::from_arrow(&arrow_ty), Some(lt));
        }
    }

    #[test]
    fn partition_field_names_preserve_spec_order() {
        let schema = Schema {
            fields: vec![],
            partition_spec: vec![
                PartitionField {
                    source_field_id: 1,
                    field_name: "active".to_string(),
                    transform: "identity".to_string(),
                },
            ],
        };
        assert_eq!(schema.partition_field_names(), vec!["active"]);
    }
}
