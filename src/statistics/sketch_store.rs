//! Optional persisted NDV sketch loading (spec §6.5): sketches live at
//! `<ledger>/stats-sketches/{values|subjects}/<ns>_<name>_<t>.hll`. Their
//! absence is not an error — callers fall back to value-count / row-count.

use crate::error::EngineResult;
use crate::storage::FileIO;

use super::hll::HyperLogLog;

/// Which half of the `{values|subjects}` split a sketch belongs to: a
/// `Values` sketch estimates distinct literal values of a column, a
/// `Subjects` sketch estimates distinct subjects bearing some property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SketchKind {
    Values,
    Subjects,
}

impl SketchKind {
    fn segment(self) -> &'static str {
        match self {
            SketchKind::Values => "values",
            SketchKind::Subjects => "subjects",
        }
    }
}

/// Resolves and loads persisted `HyperLogLog` sketches from a warehouse's
/// `stats-sketches` directory.
pub struct SketchStore {
    file_io: FileIO,
    ledger_prefix: String,
}

impl SketchStore {
    pub fn new(file_io: FileIO, ledger_prefix: impl Into<String>) -> Self {
        SketchStore {
            file_io,
            ledger_prefix: ledger_prefix.into(),
        }
    }

    fn path_for(&self, kind: SketchKind, namespace: &str, name: &str, snapshot_id: i64) -> String {
        format!(
            "{}/stats-sketches/{}/{}_{}_{}.hll",
            self.ledger_prefix.trim_end_matches('/'),
            kind.segment(),
            namespace,
            name,
            snapshot_id
        )
    }

    /// Load the sketch for `(namespace, name, snapshot_id)`, if one has
    /// been persisted. Returns `Ok(None)` when the file doesn't exist;
    /// only genuine I/O failures (permissions, a corrupt backend) surface
    /// as an error.
    pub async fn load(
        &self,
        kind: SketchKind,
        namespace: &str,
        name: &str,
        snapshot_id: i64,
    ) -> EngineResult<Option<HyperLogLog>> {
        let path = self.path_for(kind, namespace, name, snapshot_id);
        let file = self.file_io.input_file(&path);
        if !file.exists().await? {
            return Ok(None);
        }

        let len = file.get_length().await?;
        let mut stream = file.new_stream().await?;
        let bytes = stream.read(len).await?;

        Ok(HyperLogLog::from_bytes(&bytes).or_else(|| {
            tracing::warn!(path, "stats sketch has an unexpected size, ignoring it");
            None
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BlockCache, MemoryStore};
    use std::sync::Arc;
    use std::time::Duration;

    fn test_file_io() -> (FileIO, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(BlockCache::new(1024 * 1024, Duration::from_secs(300)));
        (FileIO::new(store.clone(), cache, 4096), store)
    }

    #[tokio::test]
    async fn missing_sketch_is_not_an_error() {
        let (file_io, _store) = test_file_io();
        let store = SketchStore::new(file_io, "warehouse/ns.db/airlines");
        let sketch = store
            .load(SketchKind::Values, "ns", "airlines", 42)
            .await
            .unwrap();
        assert!(sketch.is_none());
    }

    #[tokio::test]
    async fn persisted_sketch_round_trips() {
        let (file_io, backing) = test_file_io();
        let mut hll = HyperLogLog::new();
        for i in 0..1_000i64 {
            hll.insert(&i);
        }
        backing.put(
            "warehouse/ns.db/airlines/stats-sketches/values/ns_airlines_42.hll",
            bytes::Bytes::copy_from_slice(hll.as_bytes()),
        );

        let store = SketchStore::new(file_io, "warehouse/ns.db/airlines");
        let loaded = store
            .load(SketchKind::Values, "ns", "airlines", 42)
            .await
            .unwrap()
            .expect("sketch should load");
        assert_eq!(loaded.estimate(), hll.estimate());
    }
}
