//! Query Execution Module
//!
//! Ambient execution concerns that sit around the operator tree:
//! - Timeout / cancellation (spec §5)
//! - Resource limits on the hash-join build phase and result size
//!
//! ## Example
//!
//! ```rust,no_run
//! use icegraph::execution::{ExecutionConfig, ResourceLimits};
//! use std::time::Duration;
//!
//! let config = ExecutionConfig::default()
//!     .with_timeout(Duration::from_secs(30))
//!     .with_limits(ResourceLimits::unlimited().with_max_result_rows(100_000));
//! ```

mod limits;
mod timeout;

pub use limits::{ResourceError, ResourceLimits, RowTracker};
pub use timeout::{CancelHandle, QueryTimeout, TimeoutError};

use std::time::Duration;

/// Configuration for one query execution.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Query timeout duration (`None` = no timeout).
    pub timeout: Option<Duration>,

    /// Resource limits applied to the hash-join build phase and result.
    pub limits: ResourceLimits,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            timeout: None,
            limits: ResourceLimits::unlimited(),
        }
    }
}

impl ExecutionConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn query_timeout(&self) -> QueryTimeout {
        QueryTimeout::new(self.timeout)
    }
}
