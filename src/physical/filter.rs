//! `Filter` operator (spec §4.6.2): evaluates post-scan predicates
//! columnarly and passes through matching batches.

use super::plan::Plan;
use crate::arrow_util::{filter_arrow_batch, Batch, PreparedPredicate};
use crate::error::EngineResult;
use crate::iceberg_source::Schema;
use crate::planner::predicate_selectivity;
use crate::arrow_util::Predicate;
use crate::iceberg_source::Statistics;

pub struct Filter {
    child: Box<dyn Plan>,
    predicates: Vec<Predicate>,
    prepared: Vec<PreparedPredicate>,
    copy_batches: bool,
}

impl Filter {
    pub fn new(child: Box<dyn Plan>, predicates: Vec<Predicate>, copy_batches: bool) -> Self {
        let prepared = predicates.iter().map(|p| p.prepare()).collect();
        Filter {
            child,
            predicates,
            prepared,
            copy_batches,
        }
    }
}

impl Plan for Filter {
    fn open(&mut self) -> EngineResult<()> {
        self.child.open()
    }

    fn next_batch(&mut self) -> EngineResult<Option<Batch>> {
        loop {
            let Some(batch) = self.child.next_batch()? else {
                return Ok(None);
            };
            if let Some(filtered) =
                filter_arrow_batch(&batch, &self.prepared, self.copy_batches)?
            {
                return Ok(Some(filtered));
            }
        }
    }

    fn close(&mut self) -> EngineResult<()> {
        self.child.close()
    }

    fn estimated_rows(&self) -> u64 {
        // estimated_rows = child * selectivity (spec §4.6.2); selectivity
        // here is computed against an empty-stats fallback since this
        // operator sits above a scan whose own stats already folded in
        // scan-level predicates — a second-pass conservative estimate.
        let stats = Statistics {
            row_count: self.child.estimated_rows(),
            ..Default::default()
        };
        let combined: f64 = self
            .predicates
            .iter()
            .map(|p| predicate_selectivity(p, &stats))
            .product();
        ((self.child.estimated_rows() as f64 * combined).round() as u64).max(1)
    }

    fn schema(&self) -> Schema {
        self.child.schema()
    }
}
