//! `ScanOptions` (spec §3.1): what a scan of one table should read.

use crate::arrow_util::Predicate;

/// Time-travel selector: pick a specific snapshot, a point in time, or
/// the table's current snapshot (the default, when both are `None`).
#[derive(Debug, Clone, Default)]
pub struct TimeTravel {
    pub snapshot_id: Option<i64>,
    pub as_of_time_millis: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// `None` means every column.
    pub columns: Option<Vec<String>>,
    pub predicates: Vec<Predicate>,
    pub time_travel: TimeTravel,
    pub batch_size: u32,
    /// Advisory only (spec §9 Open Questions): a scan-level limit is a
    /// hint and may drop rows a downstream join still needs. The
    /// executor applies the query-level limit after all joins.
    pub limit: Option<u64>,
    pub copy_batches: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            columns: None,
            predicates: Vec::new(),
            time_travel: TimeTravel::default(),
            batch_size: 4096,
            limit: None,
            copy_batches: true,
        }
    }
}

impl ScanOptions {
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_predicates(mut self, predicates: Vec<Predicate>) -> Self {
        self.predicates = predicates;
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let opts = ScanOptions::default();
        assert_eq!(opts.batch_size, 4096);
        assert!(opts.copy_batches);
        assert!(opts.columns.is_none());
    }
}
