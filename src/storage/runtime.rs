//! Bridges the async storage layer into the engine's synchronous,
//! pull-based `Plan` interface (spec §5: "Implementations may wrap I/O in
//! a task/executor boundary as needed without changing semantics").
//!
//! A single process-wide multi-threaded runtime backs every blocking
//! call; `Scan` and `TableSource` never spin up their own runtime.

use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::Runtime;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("failed to start storage I/O runtime")
    })
}

/// Run an async storage call to completion from synchronous code.
///
/// # Panics
/// Panics if called from within a task already running on the shared
/// runtime (nested `block_on` is not supported by tokio).
pub fn block_on<F: Future>(future: F) -> F::Output {
    runtime().block_on(future)
}
