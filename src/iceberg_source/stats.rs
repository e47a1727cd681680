//! Per-table `Statistics` (spec §3.1), used by the cost model.

use std::collections::HashMap;

use crate::arrow_util::ColumnValue;

#[derive(Debug, Clone, Default)]
pub struct ColumnStats {
    pub min: Option<ColumnValue>,
    pub max: Option<ColumnValue>,
    pub null_count: u64,
    pub value_count: u64,
    pub distinct_count: Option<u64>,
}

impl ColumnStats {
    /// `ndv(side, col)` per spec §4.5.2: distinct count if known, else
    /// value count, else the table's row count (supplied by the caller).
    pub fn ndv_or(&self, fallback_row_count: u64) -> u64 {
        self.distinct_count
            .unwrap_or(self.value_count.max(1))
            .max(1)
            .min(fallback_row_count.max(1))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub row_count: u64,
    pub file_count: u64,
    pub snapshot_id: i64,
    pub timestamp_ms: i64,
    pub column_stats: HashMap<String, ColumnStats>,
}

impl Statistics {
    pub fn ndv(&self, column: &str) -> u64 {
        self.column_stats
            .get(column)
            .map(|s| s.ndv_or(self.row_count))
            .unwrap_or_else(|| self.row_count.max(1))
    }
}
