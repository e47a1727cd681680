//! Storage abstraction (spec §4.1, §6.3).
//!
//! An [`ObjectStore`] is the minimal capability the engine needs from an
//! object store: read a whole file, optionally read a byte range, and
//! optionally stat a path for its size. Implementations may provide any
//! subset; [`FileIO`](super::FileIO) degrades gracefully when range reads
//! or stat are unavailable.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;

use super::error::{StorageError, StorageResult};

/// Size metadata for a stored object.
#[derive(Debug, Clone, Copy)]
pub struct ObjectStat {
    pub size: u64,
}

/// Minimal storage capability required by the engine.
///
/// `read_bytes` is the only required method; `read_bytes_range` and
/// `stat` have default implementations that fall back to a full read, so
/// every implementer is usable even without preferred-path support, at
/// the cost of performance (no block-cached range reads, no cheap
/// length check).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an entire object into memory.
    async fn read_bytes(&self, path: &str) -> StorageResult<Bytes>;

    /// Read `[offset, offset + length)` of an object. Default: read the
    /// whole object and slice it, which is correct but defeats the
    /// purpose of block-cached range reads.
    async fn read_bytes_range(&self, path: &str, offset: u64, length: u64) -> StorageResult<Bytes> {
        let whole = self.read_bytes(path).await?;
        let file_len = whole.len() as u64;
        let end = offset.saturating_add(length);
        if offset > file_len || end > file_len {
            return Err(StorageError::OutOfBounds {
                path: path.to_string(),
                offset,
                length,
                file_len,
            });
        }
        Ok(whole.slice(offset as usize..end as usize))
    }

    /// Size of an object. Default: read the whole object to learn its
    /// length.
    async fn stat(&self, path: &str) -> StorageResult<ObjectStat> {
        let whole = self.read_bytes(path).await?;
        Ok(ObjectStat {
            size: whole.len() as u64,
        })
    }

    /// Whether this backend supports range reads without a full-file
    /// fallback. [`FileIO`](super::FileIO) uses this to decide whether to
    /// route through the block cache at all.
    fn supports_range_reads(&self) -> bool {
        false
    }

    /// Write bytes to a path. Not used by the read-only core; provided
    /// for completeness of the interface (spec §4.1).
    async fn write_bytes(&self, _path: &str, _bytes: Bytes) -> StorageResult<()> {
        Err(StorageError::Unsupported("write_bytes"))
    }
}

/// `opendal`-backed store. Wraps any `opendal::Operator` (filesystem, S3,
/// memory, ...) behind the [`ObjectStore`] trait.
pub struct OpendalStore {
    operator: opendal::Operator,
}

impl OpendalStore {
    pub fn new(operator: opendal::Operator) -> Self {
        OpendalStore { operator }
    }
}

#[async_trait]
impl ObjectStore for OpendalStore {
    async fn read_bytes(&self, path: &str) -> StorageResult<Bytes> {
        let buf = self.operator.read(path).await?;
        Ok(buf.to_bytes())
    }

    async fn read_bytes_range(&self, path: &str, offset: u64, length: u64) -> StorageResult<Bytes> {
        let range = offset..offset + length;
        let buf = self.operator.read_with(path).range(range).await?;
        Ok(buf.to_bytes())
    }

    async fn stat(&self, path: &str) -> StorageResult<ObjectStat> {
        let meta = self.operator.stat(path).await?;
        Ok(ObjectStat {
            size: meta.content_length(),
        })
    }

    fn supports_range_reads(&self) -> bool {
        true
    }

    async fn write_bytes(&self, path: &str, bytes: Bytes) -> StorageResult<()> {
        self.operator.write(path, bytes).await?;
        Ok(())
    }
}

/// In-memory store used by tests and by the seed-test fixtures in
/// `tests/`. Supports range reads so block-cache behavior is exercised
/// without touching the filesystem.
#[derive(Default)]
pub struct MemoryStore {
    files: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: impl Into<String>, bytes: impl Into<Bytes>) {
        self.files.write().unwrap().insert(path.into(), bytes.into());
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn read_bytes(&self, path: &str) -> StorageResult<Bytes> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::Backend(opendal::Error::new(
                opendal::ErrorKind::NotFound,
                format!("no such object: {path}"),
            )))
    }

    async fn read_bytes_range(&self, path: &str, offset: u64, length: u64) -> StorageResult<Bytes> {
        let whole = self.read_bytes(path).await?;
        let file_len = whole.len() as u64;
        let end = offset.saturating_add(length);
        if offset > file_len || end > file_len {
            return Err(StorageError::OutOfBounds {
                path: path.to_string(),
                offset,
                length,
                file_len,
            });
        }
        Ok(whole.slice(offset as usize..end as usize))
    }

    async fn stat(&self, path: &str) -> StorageResult<ObjectStat> {
        let whole = self.read_bytes(path).await?;
        Ok(ObjectStat {
            size: whole.len() as u64,
        })
    }

    fn supports_range_reads(&self) -> bool {
        true
    }

    async fn write_bytes(&self, path: &str, bytes: Bytes) -> StorageResult<()> {
        self.put(path, bytes);
        Ok(())
    }
}
