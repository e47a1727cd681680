//! Resource limits for query execution (§2.4 of the expanded spec: ambient
//! hygiene around the hash-join build phase and final result size).
//!
//! Uses cooperative checking: operators call `add` as they accumulate
//! rows, rather than the engine polling a background thread.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Resource limit error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResourceError {
    /// The hash-join build side grew past its row cap before the build
    /// child was exhausted. Guards against the Cartesian-step fallback in
    /// the greedy join order (spec §4.5.4 step 3) exhausting memory.
    #[error("hash-join build side exceeded {limit} rows (had {actual})")]
    BuildSideTooLarge { limit: usize, actual: usize },

    /// The final result set grew past its row cap.
    #[error("result set exceeded {limit} rows (had {actual})")]
    ResultTooLarge { limit: usize, actual: usize },
}

/// Configurable caps on query execution. `None` means unlimited.
#[derive(Debug, Clone, Default)]
pub struct ResourceLimits {
    /// Maximum rows materialized into a single hash-join build table.
    pub max_build_side_rows: Option<usize>,

    /// Maximum rows in the final result set, checked once basic and
    /// transitive patterns are joined and merged but before the query's
    /// own `options.limit` truncates further.
    pub max_result_rows: Option<usize>,
}

impl ResourceLimits {
    pub fn unlimited() -> Self {
        ResourceLimits::default()
    }

    pub fn with_max_build_side_rows(mut self, n: usize) -> Self {
        self.max_build_side_rows = Some(n);
        self
    }

    pub fn with_max_result_rows(mut self, n: usize) -> Self {
        self.max_result_rows = Some(n);
        self
    }

    /// Construct a tracker for one hash-join build phase.
    pub fn build_side_tracker(&self) -> RowTracker {
        RowTracker::new(self.max_build_side_rows, TrackerKind::BuildSide)
    }

    /// Construct a tracker for the final result stream.
    pub fn result_tracker(&self) -> RowTracker {
        RowTracker::new(self.max_result_rows, TrackerKind::Result)
    }
}

#[derive(Clone, Copy)]
enum TrackerKind {
    BuildSide,
    Result,
}

/// A shared, atomically-updated row counter checked against an optional
/// cap. Cloning shares the same counter (`Arc` inside).
#[derive(Clone)]
pub struct RowTracker {
    count: Arc<AtomicUsize>,
    limit: Option<usize>,
    kind: TrackerKind,
}

impl RowTracker {
    fn new(limit: Option<usize>, kind: TrackerKind) -> Self {
        RowTracker {
            count: Arc::new(AtomicUsize::new(0)),
            limit,
            kind,
        }
    }

    /// Record `n` additional rows, erroring if the cap is now exceeded.
    pub fn add(&self, n: usize) -> Result<(), ResourceError> {
        let total = self.count.fetch_add(n, Ordering::Relaxed) + n;
        if let Some(limit) = self.limit {
            if total > limit {
                return Err(match self.kind {
                    TrackerKind::BuildSide => ResourceError::BuildSideTooLarge {
                        limit,
                        actual: total,
                    },
                    TrackerKind::Result => ResourceError::ResultTooLarge {
                        limit,
                        actual: total,
                    },
                });
            }
        }
        Ok(())
    }

    pub fn current(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_never_errors() {
        let tracker = ResourceLimits::unlimited().build_side_tracker();
        assert!(tracker.add(1_000_000).is_ok());
    }

    #[test]
    fn exceeding_cap_errors() {
        let limits = ResourceLimits::unlimited().with_max_build_side_rows(10);
        let tracker = limits.build_side_tracker();
        assert!(tracker.add(5).is_ok());
        assert!(tracker.add(10).is_err());
    }
}

