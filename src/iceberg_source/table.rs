//! `TableSource`: the Iceberg adapter (spec §4.2).
//!
//! Loads table metadata, manifest lists, manifests, and data files
//! through the engine's own [`FileIO`] (never a bundled catalog client),
//! so every byte read passes through the block cache. Table metadata is
//! plain JSON, decoded with `serde_json`. Manifest lists and manifests
//! are Avro object-container files; this module decodes them directly
//! with `apache_avro` against the field names the Iceberg table spec
//! defines (<https://iceberg.apache.org/spec/#manifests>), rather than a
//! bundled Iceberg client's own struct types — see DESIGN.md.

use std::collections::HashMap;
use std::sync::Arc;

use apache_avro::types::Value as AvroValue;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value;

use super::cache::TableCache;
use super::schema::{FieldSchema, LogicalType, PartitionField, Schema};
use super::scan::ScanOptions;
use super::stats::{ColumnStats, Statistics};
use crate::arrow_util::{filter_arrow_batch, Batch, ColumnValue, Predicate};
use crate::error::{EngineError, EngineResult};
use crate::storage::FileIO;

/// One Iceberg data file reference, resolved from the current snapshot's
/// manifest list (spec §4.2, §4.5 "partition pruning").
#[derive(Debug, Clone)]
struct DataFileRef {
    path: String,
    record_count: u64,
    /// Partition field name -> stringified partition value, used for
    /// pruning without opening the file.
    partition_values: HashMap<String, String>,
}

/// An immutable snapshot of one Iceberg table's metadata (spec §3.1
/// invariant 1: a `TableSource` is bound to its metadata location for
/// life; a new snapshot means a new `TableSource`).
#[derive(Debug, Clone)]
pub struct TableSource {
    pub table_name: String,
    pub metadata_location: String,
    schema: Schema,
    current_snapshot_id: Option<i64>,
    manifest_list_location: Option<String>,
    summary: HashMap<String, String>,
}

impl TableSource {
    /// Load (or fetch from `cache`) the table bound to `metadata_location`.
    pub fn load_from_metadata(
        file_io: &FileIO,
        cache: &TableCache,
        metadata_location: &str,
        table_name: &str,
    ) -> EngineResult<Arc<TableSource>> {
        cache.get_or_load(metadata_location, || {
            let bytes = crate::storage::block_on(async {
                let input = file_io.input_file(metadata_location);
                let len = input.get_length().await?;
                let mut stream = input.new_stream().await?;
                stream.read(len).await
            })
            .map_err(EngineError::from)?;

            let metadata: Value = serde_json::from_slice(&bytes).map_err(|e| {
                EngineError::catalog(format!("invalid table metadata JSON: {e}"))
            })?;
            Self::parse(metadata, metadata_location, table_name)
        })
    }

    fn parse(metadata: Value, metadata_location: &str, table_name: &str) -> EngineResult<TableSource> {
        let current_schema_id = metadata
            .get("current-schema-id")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let schemas = metadata
            .get("schemas")
            .and_then(Value::as_array)
            .ok_or_else(|| EngineError::catalog("table metadata missing 'schemas'"))?;
        let schema_json = schemas
            .iter()
            .find(|s| s.get("schema-id").and_then(Value::as_i64) == Some(current_schema_id))
            .or_else(|| schemas.first())
            .ok_or_else(|| EngineError::catalog("table metadata has no usable schema"))?;

        let default_spec_id = metadata
            .get("default-spec-id")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let partition_specs = metadata
            .get("partition-specs")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let spec_json = partition_specs
            .iter()
            .find(|s| s.get("spec-id").and_then(Value::as_i64) == Some(default_spec_id));

        let partition_field_names: Vec<String> = spec_json
            .and_then(|s| s.get("fields"))
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|f| f.get("name").and_then(Value::as_str))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let partition_spec: Vec<PartitionField> = spec_json
            .and_then(|s| s.get("fields"))
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|f| {
                        Some(PartitionField {
                            source_field_id: f.get("source-id")?.as_i64()? as i32,
                            field_name: f.get("name")?.as_str()?.to_string(),
                            transform: f.get("transform")?.as_str()?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let fields = schema_json
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| EngineError::catalog("schema missing 'fields'"))?
            .iter()
            .map(|f| parse_field(f, &partition_field_names))
            .collect::<EngineResult<Vec<_>>>()?;

        let current_snapshot_id = metadata.get("current-snapshot-id").and_then(Value::as_i64);
        let snapshots = metadata
            .get("snapshots")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let current_snapshot = current_snapshot_id
            .and_then(|id| snapshots.iter().find(|s| s.get("snapshot-id").and_then(Value::as_i64) == Some(id)));

        let manifest_list_location = current_snapshot
            .and_then(|s| s.get("manifest-list"))
            .and_then(Value::as_str)
            .map(String::from);

        let summary: HashMap<String, String> = current_snapshot
            .and_then(|s| s.get("summary"))
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(TableSource {
            table_name: table_name.to_string(),
            metadata_location: metadata_location.to_string(),
            schema: Schema { fields, partition_spec },
            current_snapshot_id,
            manifest_list_location,
            summary,
        })
    }

    pub fn get_schema(&self) -> &Schema {
        &self.schema
    }

    /// Row/file counts from the snapshot summary (spec §4.2); column
    /// stats default empty unless sketches supply them (spec §6.5 — a
    /// missing sketch degrades the cost model rather than erroring).
    pub fn get_statistics(&self) -> Statistics {
        let row_count = self
            .summary
            .get("total-records")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let file_count = self
            .summary
            .get("total-data-files")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        Statistics {
            row_count,
            file_count,
            snapshot_id: self.current_snapshot_id.unwrap_or(-1),
            timestamp_ms: 0,
            column_stats: HashMap::new(),
        }
    }

    pub fn with_column_stats(&self, stats: &mut Statistics, sketches: HashMap<String, ColumnStats>) {
        stats.column_stats = sketches;
    }

    /// List the data files this scan needs, applying partition pruning
    /// (spec §4.5, testable property 15) from pushed-down predicates on
    /// partition columns, without opening any data file.
    fn planned_data_files(&self, opts: &ScanOptions, file_io: &FileIO) -> EngineResult<Vec<DataFileRef>> {
        let Some(manifest_list_location) = &self.manifest_list_location else {
            return Ok(Vec::new());
        };
        let entries = crate::storage::block_on(async {
            let input = file_io.input_file(manifest_list_location);
            let len = input.get_length().await?;
            let mut stream = input.new_stream().await?;
            stream.read(len).await
        })
        .map_err(EngineError::from)?;

        let manifests = parse_manifest_list(&entries)?;
        let mut data_files = Vec::new();
        for manifest_path in manifests {
            let manifest_bytes = crate::storage::block_on(async {
                let input = file_io.input_file(&manifest_path);
                let len = input.get_length().await?;
                let mut stream = input.new_stream().await?;
                stream.read(len).await
            })
            .map_err(EngineError::from)?;
            data_files.extend(parse_manifest(&manifest_bytes)?);
        }

        let partition_names = self.schema.partition_field_names();
        let pruned = data_files
            .into_iter()
            .filter(|file| partition_survives(file, &partition_names, opts))
            .collect();
        Ok(pruned)
    }

    /// Primary scan path: Arrow batches with column projection, predicate
    /// pushdown, and partition pruning applied (spec §4.2).
    pub fn scan_arrow_batches(
        &self,
        file_io: &FileIO,
        opts: &ScanOptions,
    ) -> EngineResult<Vec<Batch>> {
        let files = self.planned_data_files(opts, file_io)?;
        let prepared: Vec<_> = opts.predicates.iter().map(|p| p.prepare()).collect();
        let mut out = Vec::new();
        let mut rows_emitted = 0u64;

        for file in files {
            let bytes = crate::storage::block_on(async {
                let input = file_io.input_file(&file.path);
                let len = input.get_length().await?;
                let mut stream = input.new_stream().await?;
                stream.read(len).await
            })
            .map_err(EngineError::from)?;

            for record_batch in read_parquet_batches(bytes, opts)? {
                let batch = Batch::from_record_batch(record_batch);
                let batch = match opts.columns.as_ref() {
                    Some(columns) => batch
                        .project(columns)
                        .map_err(|e| EngineError::schema(e.to_string()))?,
                    None => batch,
                };
                match filter_arrow_batch(&batch, &prepared, opts.copy_batches)
                    .map_err(EngineError::from)?
                {
                    Some(filtered) => {
                        rows_emitted += filtered.num_rows() as u64;
                        out.push(filtered);
                    }
                    None => continue,
                }
                if let Some(limit) = opts.limit {
                    if rows_emitted >= limit {
                        return Ok(out);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Convenience wrapper for row-at-a-time consumers (spec §4.2).
    pub fn scan_rows(
        &self,
        file_io: &FileIO,
        opts: &ScanOptions,
    ) -> EngineResult<Vec<crate::arrow_util::Row>> {
        let mut rows = Vec::new();
        for batch in self.scan_arrow_batches(file_io, opts)? {
            rows.extend(crate::arrow_util::batch_to_rows(&batch).map_err(EngineError::from)?);
        }
        Ok(rows)
    }
}

fn parse_field(field: &Value, partition_field_names: &[String]) -> EngineResult<FieldSchema> {
    let name = field
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::catalog("schema field missing 'name'"))?
        .to_string();
    let required = field.get("required").and_then(Value::as_bool).unwrap_or(false);
    let type_str = field
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::catalog(format!("schema field '{name}' missing 'type'")))?;
    let logical_type = parse_iceberg_type(type_str)
        .ok_or_else(|| EngineError::schema(format!("unsupported column type: ({name}, {type_str})")))?;
    Ok(FieldSchema {
        is_partition_key: partition_field_names.iter().any(|p| p == &name),
        name,
        logical_type,
        nullable: !required,
    })
}

fn parse_iceberg_type(type_str: &str) -> Option<LogicalType> {
    if let Some(rest) = type_str.strip_prefix("decimal(") {
        let rest = rest.strip_suffix(')')?;
        let (p, s) = rest.split_once(',')?;
        return Some(LogicalType::Decimal128 {
            precision: p.trim().parse().ok()?,
            scale: s.trim().parse().ok()?,
        });
    }
    match type_str {
        "int" => Some(LogicalType::Int32),
        "long" => Some(LogicalType::Int64),
        "float" => Some(LogicalType::Float32),
        "double" => Some(LogicalType::Float64),
        "string" => Some(LogicalType::Utf8),
        "binary" => Some(LogicalType::Binary),
        "boolean" => Some(LogicalType::Bool),
        "date" => Some(LogicalType::Date32),
        "timestamp" => Some(LogicalType::TimestampMicros),
        "timestamptz" => Some(LogicalType::TimestampMicrosTz),
        _ => None,
    }
}

/// An Avro union value (`["null", T]`) unwraps to its non-null branch;
/// anything else passes through unchanged.
fn avro_unwrap_union(value: &AvroValue) -> &AvroValue {
    match value {
        AvroValue::Union(_, inner) => inner,
        other => other,
    }
}

fn avro_field<'a>(fields: &'a [(String, AvroValue)], name: &str) -> Option<&'a AvroValue> {
    fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
}

fn avro_as_str(value: &AvroValue) -> Option<&str> {
    match avro_unwrap_union(value) {
        AvroValue::String(s) => Some(s.as_str()),
        _ => None,
    }
}

fn avro_as_i64(value: &AvroValue) -> Option<i64> {
    match avro_unwrap_union(value) {
        AvroValue::Long(n) => Some(*n),
        AvroValue::Int(n) => Some(i64::from(*n)),
        _ => None,
    }
}

/// Render one partition column's Avro value as a plain string for
/// equality-based pruning (spec §4.5) — no partition-spec type context
/// is needed since pruning only ever compares against an already-
/// stringified predicate value.
fn avro_value_to_display(value: &AvroValue) -> String {
    match avro_unwrap_union(value) {
        AvroValue::Null => String::new(),
        AvroValue::Boolean(b) => b.to_string(),
        AvroValue::Int(n) => n.to_string(),
        AvroValue::Long(n) => n.to_string(),
        AvroValue::Float(f) => f.to_string(),
        AvroValue::Double(f) => f.to_string(),
        AvroValue::String(s) => s.clone(),
        AvroValue::Bytes(b) | AvroValue::Fixed(_, b) => {
            b.iter().map(|byte| format!("{byte:02x}")).collect()
        }
        other => format!("{other:?}"),
    }
}

/// The manifest entry's `partition` field is written as either a
/// `{name: value}` map (the common simplified encoding) or a record of
/// named partition fields; both flatten to the same string map.
fn partition_value_map(value: &AvroValue) -> HashMap<String, String> {
    match avro_unwrap_union(value) {
        AvroValue::Map(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), avro_value_to_display(v)))
            .collect(),
        AvroValue::Record(fields) => fields
            .iter()
            .map(|(k, v)| (k.clone(), avro_value_to_display(v)))
            .collect(),
        _ => HashMap::new(),
    }
}

/// Decode a manifest-list Avro file (object container format, writer
/// schema embedded in the header) into the manifest paths it references.
fn parse_manifest_list(bytes: &Bytes) -> EngineResult<Vec<String>> {
    let reader = apache_avro::Reader::new(bytes.as_ref())
        .map_err(|e| EngineError::catalog(format!("invalid manifest list: {e}")))?;
    let mut paths = Vec::new();
    for value in reader {
        let value = value.map_err(|e| EngineError::catalog(format!("invalid manifest list entry: {e}")))?;
        let AvroValue::Record(fields) = value else {
            return Err(EngineError::catalog("manifest list entry was not an Avro record"));
        };
        let path = avro_field(&fields, "manifest_path")
            .and_then(avro_as_str)
            .ok_or_else(|| EngineError::catalog("manifest list entry missing 'manifest_path'"))?;
        paths.push(path.to_string());
    }
    Ok(paths)
}

/// Decode one manifest Avro file into its live (non-deleted) data-file
/// entries. `status`: 0 = EXISTING, 1 = ADDED, 2 = DELETED (Iceberg table
/// spec); only `DELETED` entries are excluded from a scan.
fn parse_manifest(bytes: &Bytes) -> EngineResult<Vec<DataFileRef>> {
    const STATUS_DELETED: i64 = 2;

    let reader = apache_avro::Reader::new(bytes.as_ref())
        .map_err(|e| EngineError::catalog(format!("invalid manifest: {e}")))?;
    let mut files = Vec::new();
    for value in reader {
        let value = value.map_err(|e| EngineError::catalog(format!("invalid manifest entry: {e}")))?;
        let AvroValue::Record(fields) = value else {
            return Err(EngineError::catalog("manifest entry was not an Avro record"));
        };
        let status = avro_field(&fields, "status").and_then(avro_as_i64).unwrap_or(1);
        if status == STATUS_DELETED {
            continue;
        }
        let data_file = avro_field(&fields, "data_file")
            .ok_or_else(|| EngineError::catalog("manifest entry missing 'data_file'"))?;
        let AvroValue::Record(data_file_fields) = avro_unwrap_union(data_file) else {
            return Err(EngineError::catalog("manifest entry's 'data_file' was not an Avro record"));
        };
        let path = avro_field(data_file_fields, "file_path")
            .and_then(avro_as_str)
            .ok_or_else(|| EngineError::catalog("data file missing 'file_path'"))?
            .to_string();
        let record_count = avro_field(data_file_fields, "record_count")
            .and_then(avro_as_i64)
            .unwrap_or(0) as u64;
        let partition_values = avro_field(data_file_fields, "partition")
            .map(partition_value_map)
            .unwrap_or_default();
        files.push(DataFileRef {
            path,
            record_count,
            partition_values,
        });
    }
    Ok(files)
}

fn column_value_to_display(value: &ColumnValue) -> String {
    match value {
        ColumnValue::Int32(v) => v.to_string(),
        ColumnValue::Int64(v) => v.to_string(),
        ColumnValue::Float32(v) => v.to_string(),
        ColumnValue::Float64(v) => v.to_string(),
        ColumnValue::Utf8(v) => v.clone(),
        ColumnValue::Binary(v) => v.iter().map(|b| format!("{b:02x}")).collect(),
        ColumnValue::Bool(v) => v.to_string(),
        ColumnValue::Date32(v) => v.to_string(),
        ColumnValue::TimestampMicros(v) => v.to_string(),
        ColumnValue::TimestampMicrosTz(v) => v.to_string(),
        ColumnValue::Decimal128(v) => v.to_string(),
    }
}

fn partition_survives(file: &DataFileRef, partition_names: &[&str], opts: &ScanOptions) -> bool {
    fn matches(file: &DataFileRef, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::Eq { column, value } => match file.partition_values.get(column) {
                Some(v) => v == &column_value_to_display(value),
                None => true,
            },
            Predicate::And { children } => children.iter().all(|c| matches(file, c)),
            Predicate::Or { children } => children.iter().any(|c| matches(file, c)),
            _ => true,
        }
    }

    if partition_names.is_empty() {
        return true;
    }
    opts.predicates.iter().all(|p| matches(file, p))
}

fn read_parquet_batches(bytes: Bytes, opts: &ScanOptions) -> EngineResult<Vec<RecordBatch>> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)
        .map_err(|e| EngineError::execution(format!("failed to open parquet file: {e}")))?
        .with_batch_size(opts.batch_size as usize);
    let reader = builder
        .build()
        .map_err(|e| EngineError::execution(format!("failed to build parquet reader: {e}")))?;
    reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| EngineError::execution(format!("parquet decode error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BlockCache, FileIO, MemoryStore};
    use apache_avro::{Schema as AvroSchema, Writer as AvroWriter};
    use arrow::array::{Int32Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
    use parquet::arrow::ArrowWriter;
    use std::time::Duration;

    const MANIFEST_LIST_SCHEMA: &str = r#"{
        "type": "record",
        "name": "manifest_file",
        "fields": [
            {"name": "manifest_path", "type": "string"},
            {"name": "manifest_length", "type": "long"},
            {"name": "partition_spec_id", "type": "int"},
            {"name": "added_snapshot_id", "type": "long"},
            {"name": "added_data_files_count", "type": "int"},
            {"name": "added_rows_count", "type": "long"}
        ]
    }"#;

    const MANIFEST_ENTRY_SCHEMA: &str = r#"{
        "type": "record",
        "name": "manifest_entry",
        "fields": [
            {"name": "status", "type": "int"},
            {"name": "snapshot_id", "type": ["null", "long"], "default": null},
            {"name": "data_file", "type": {
                "type": "record",
                "name": "r2",
                "fields": [
                    {"name": "file_path", "type": "string"},
                    {"name": "file_format", "type": "string"},
                    {"name": "partition", "type": {"type": "map", "values": "string"}},
                    {"name": "record_count", "type": "long"}
                ]
            }}
        ]
    }"#;

    fn write_manifest_list(manifest_paths: &[&str]) -> Bytes {
        let schema = AvroSchema::parse_str(MANIFEST_LIST_SCHEMA).unwrap();
        let mut writer = AvroWriter::new(&schema, Vec::new());
        for path in manifest_paths {
            let record = AvroValue::Record(vec![
                ("manifest_path".to_string(), AvroValue::String((*path).to_string())),
                ("manifest_length".to_string(), AvroValue::Long(0)),
                ("partition_spec_id".to_string(), AvroValue::Int(0)),
                ("added_snapshot_id".to_string(), AvroValue::Long(1)),
                ("added_data_files_count".to_string(), AvroValue::Int(1)),
                ("added_rows_count".to_string(), AvroValue::Long(0)),
            ]);
            writer.append(record).unwrap();
        }
        Bytes::from(writer.into_inner().unwrap())
    }

    fn write_manifest(entries: &[(i32, &str, &str, i64, &[(&str, &str)])]) -> Bytes {
        let schema = AvroSchema::parse_str(MANIFEST_ENTRY_SCHEMA).unwrap();
        let mut writer = AvroWriter::new(&schema, Vec::new());
        for (status, file_path, file_format, record_count, partition) in entries {
            let partition_map: HashMap<String, AvroValue> = partition
                .iter()
                .map(|(k, v)| ((*k).to_string(), AvroValue::String((*v).to_string())))
                .collect();
            let data_file = AvroValue::Record(vec![
                ("file_path".to_string(), AvroValue::String((*file_path).to_string())),
                ("file_format".to_string(), AvroValue::String((*file_format).to_string())),
                ("partition".to_string(), AvroValue::Map(partition_map)),
                ("record_count".to_string(), AvroValue::Long(*record_count)),
            ]);
            let entry = AvroValue::Record(vec![
                ("status".to_string(), AvroValue::Int(*status)),
                (
                    "snapshot_id".to_string(),
                    AvroValue::Union(1, Box::new(AvroValue::Long(1))),
                ),
                ("data_file".to_string(), data_file),
            ]);
            writer.append(entry).unwrap();
        }
        Bytes::from(writer.into_inner().unwrap())
    }

    fn sample_parquet_bytes() -> Bytes {
        let schema = Arc::new(ArrowSchema::new(vec![
            Field::new("id", DataType::Int32, true),
            Field::new("country", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            Arc::clone(&schema),
            vec![
                Arc::new(Int32Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec!["US", "CA", "US"])),
            ],
        )
        .unwrap();
        let mut buf = Vec::new();
        {
            let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
            writer.write(&batch).unwrap();
            writer.close().unwrap();
        }
        Bytes::from(buf)
    }

    fn metadata_json(manifest_list_path: &str) -> Value {
        serde_json::json!({
            "current-schema-id": 0,
            "schemas": [{
                "schema-id": 0,
                "fields": [
                    {"name": "id", "type": "int", "required": false},
                    {"name": "country", "type": "string", "required": false}
                ]
            }],
            "default-spec-id": 0,
            "partition-specs": [{"spec-id": 0, "fields": []}],
            "current-snapshot-id": 1,
            "snapshots": [{
                "snapshot-id": 1,
                "manifest-list": manifest_list_path,
                "summary": {"total-records": "3", "total-data-files": "1"}
            }]
        })
    }

    fn file_io_with(files: &[(&str, Bytes)]) -> FileIO {
        let store = MemoryStore::new();
        for (path, bytes) in files {
            store.put(*path, bytes.clone());
        }
        FileIO::new(Arc::new(store), Arc::new(BlockCache::new(1 << 20, Duration::from_secs(60))), 4096)
    }

    #[test]
    fn parse_manifest_list_reads_back_written_paths() {
        let bytes = write_manifest_list(&["s3://bucket/manifest-1.avro", "s3://bucket/manifest-2.avro"]);
        let paths = parse_manifest_list(&bytes).unwrap();
        assert_eq!(paths, vec!["s3://bucket/manifest-1.avro", "s3://bucket/manifest-2.avro"]);
    }

    #[test]
    fn parse_manifest_skips_deleted_entries() {
        let bytes = write_manifest(&[
            (1, "data/a.parquet", "PARQUET", 10, &[("country", "US")]),
            (2, "data/b.parquet", "PARQUET", 20, &[("country", "CA")]),
            (0, "data/c.parquet", "PARQUET", 30, &[("country", "MX")]),
        ]);
        let files = parse_manifest(&bytes).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["data/a.parquet", "data/c.parquet"]);
        assert_eq!(files[0].record_count, 10);
        assert_eq!(files[0].partition_values.get("country"), Some(&"US".to_string()));
    }

    #[test]
    fn table_source_parses_metadata_and_scans_a_data_file() {
        let manifest_list_bytes = write_manifest_list(&["manifest-1.avro"]);
        let manifest_bytes = write_manifest(&[(1, "data/file-1.parquet", "PARQUET", 3, &[])]);
        let parquet_bytes = sample_parquet_bytes();

        let file_io = file_io_with(&[
            ("manifest-list.avro", manifest_list_bytes),
            ("manifest-1.avro", manifest_bytes),
            ("data/file-1.parquet", parquet_bytes),
        ]);
        let metadata = metadata_json("manifest-list.avro");
        let table = TableSource::parse(metadata, "metadata/v1.metadata.json", "countries").unwrap();

        assert_eq!(table.get_schema().fields.len(), 2);
        let stats = table.get_statistics();
        assert_eq!(stats.row_count, 3);
        assert_eq!(stats.file_count, 1);

        let batches = table.scan_arrow_batches(&file_io, &ScanOptions::default()).unwrap();
        let total_rows: usize = batches.iter().map(Batch::num_rows).sum();
        assert_eq!(total_rows, 3);
    }

    #[test]
    fn partition_survives_keeps_files_not_excluded_by_an_eq_predicate() {
        let file = DataFileRef {
            path: "data/us.parquet".to_string(),
            record_count: 1,
            partition_values: HashMap::from([("country".to_string(), "US".to_string())]),
        };
        let opts = ScanOptions {
            predicates: vec![Predicate::Eq {
                column: "country".to_string(),
                value: ColumnValue::Utf8("US".to_string()),
            }],
            ..ScanOptions::default()
        };
        assert!(partition_survives(&file, &["country"], &opts));

        let mismatched = ScanOptions {
            predicates: vec![Predicate::Eq {
                column: "country".to_string(),
                value: ColumnValue::Utf8("CA".to_string()),
            }],
            ..ScanOptions::default()
        };
        assert!(!partition_survives(&file, &["country"], &mismatched));
    }

    #[test]
    fn parse_iceberg_type_handles_decimal_and_primitives() {
        assert_eq!(parse_iceberg_type("int"), Some(LogicalType::Int32));
        assert_eq!(
            parse_iceberg_type("decimal(10, 2)"),
            Some(LogicalType::Decimal128 { precision: 10, scale: 2 })
        );
        assert_eq!(parse_iceberg_type("not-a-type"), None);
    }
}
