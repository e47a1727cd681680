//! `Scan` operator (spec §4.6.1).

use std::sync::Arc;

use super::plan::Plan;
use crate::arrow_util::Batch;
use crate::error::EngineResult;
use crate::iceberg_source::{ScanOptions, Schema, TableSource};
use crate::planner::selected_rows;
use crate::storage::FileIO;

pub struct Scan {
    table: Arc<TableSource>,
    file_io: FileIO,
    opts: ScanOptions,
    buffered: Vec<Batch>,
    cursor: usize,
    opened: bool,
}

impl Scan {
    pub fn new(table: Arc<TableSource>, file_io: FileIO, opts: ScanOptions) -> Self {
        Scan {
            table,
            file_io,
            opts,
            buffered: Vec::new(),
            cursor: 0,
            opened: false,
        }
    }
}

impl Plan for Scan {
    fn open(&mut self) -> EngineResult<()> {
        if self.opened {
            return Ok(());
        }
        self.buffered = self.table.scan_arrow_batches(&self.file_io, &self.opts)?;
        self.cursor = 0;
        self.opened = true;
        Ok(())
    }

    fn next_batch(&mut self) -> EngineResult<Option<Batch>> {
        if !self.opened {
            self.open()?;
        }
        if self.cursor >= self.buffered.len() {
            return Ok(None);
        }
        let batch = self.buffered[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(batch))
    }

    fn close(&mut self) -> EngineResult<()> {
        self.buffered.clear();
        self.cursor = 0;
        self.opened = false;
        Ok(())
    }

    fn estimated_rows(&self) -> u64 {
        let stats = self.table.get_statistics();
        if stats.row_count == 0 {
            return 1_000;
        }
        selected_rows(&self.opts.predicates, &stats)
    }

    fn schema(&self) -> Schema {
        let full = self.table.get_schema();
        match &self.opts.columns {
            Some(columns) => Schema {
                fields: full
                    .fields
                    .iter()
                    .filter(|f| columns.contains(&f.name))
                    .cloned()
                    .collect(),
                partition_spec: full.partition_spec.clone(),
            },
            None => full.clone(),
        }
    }
}
