//! `TableSource` cache (spec §5 "Shared resources"): a bounded LRU keyed
//! by metadata location. Insertions are idempotent — loading the same
//! location twice returns the same `Arc`, never re-parses.

use std::sync::Arc;

use moka::sync::Cache;

use super::table::TableSource;
use crate::error::EngineResult;

#[derive(Clone)]
pub struct TableCache {
    inner: Cache<String, Arc<TableSource>>,
}

impl TableCache {
    pub fn new(max_entries: u64) -> Self {
        TableCache {
            inner: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    /// Return the cached table for `metadata_location`, or run `load` and
    /// cache its result. Eviction is always safe: entries are immutable
    /// (spec §5).
    pub fn get_or_load(
        &self,
        metadata_location: &str,
        load: impl FnOnce() -> EngineResult<TableSource>,
    ) -> EngineResult<Arc<TableSource>> {
        if let Some(cached) = self.inner.get(metadata_location) {
            return Ok(cached);
        }
        let loaded = Arc::new(load()?);
        self.inner.insert(metadata_location.to_string(), Arc::clone(&loaded));
        Ok(loaded)
    }

    pub fn invalidate(&self, metadata_location: &str) {
        self.inner.invalidate(metadata_location);
    }

    #[cfg(test)]
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl Default for TableCache {
    fn default() -> Self {
        TableCache::new(256)
    }
}
