//! Seekable, block-cached byte stream over an [`ObjectStore`] path
//! (spec §4.1, testable properties 10-13).

use bytes::{Bytes, BytesMut};
use std::sync::Arc;

use super::backend::ObjectStore;
use super::block_cache::{BlockCache, BlockKey};
use super::error::{StorageError, StorageResult};

/// A pull-based, absolute-seek reader that decomposes any requested
/// `[position, position + len)` range into block-aligned fetches against
/// the shared [`BlockCache`] (testable property 11).
pub struct SeekableInputStream {
    path: Arc<str>,
    store: Arc<dyn ObjectStore>,
    cache: Arc<BlockCache>,
    block_size: u32,
    file_len: u64,
    position: u64,
}

impl SeekableInputStream {
    pub(super) fn new(
        path: Arc<str>,
        store: Arc<dyn ObjectStore>,
        cache: Arc<BlockCache>,
        block_size: u32,
        file_len: u64,
    ) -> Self {
        SeekableInputStream {
            path,
            store,
            cache,
            block_size,
            file_len,
            position: 0,
        }
    }

    pub fn len(&self) -> u64 {
        self.file_len
    }

    pub fn is_empty(&self) -> bool {
        self.file_len == 0
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Move the read cursor to an absolute offset.
    pub fn seek(&mut self, position: u64) -> StorageResult<()> {
        if position > self.file_len {
            return Err(StorageError::OutOfBounds {
                path: self.path.to_string(),
                offset: position,
                length: 0,
                file_len: self.file_len,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Read `len` bytes starting at the current position, advancing the
    /// cursor. Issues only block-aligned range reads, concatenating
    /// blocks that span the requested range.
    pub async fn read(&mut self, len: u64) -> StorageResult<Bytes> {
        let bytes = self.read_at(self.position, len).await?;
        self.position += bytes.len() as u64;
        Ok(bytes)
    }

    /// Read `[offset, offset + len)` without disturbing the cursor.
    pub async fn read_at(&self, offset: u64, len: u64) -> StorageResult<Bytes> {
        let end = offset.saturating_add(len).min(self.file_len);
        if offset > self.file_len {
            return Err(StorageError::OutOfBounds {
                path: self.path.to_string(),
                offset,
                length: len,
                file_len: self.file_len,
            });
        }
        if end <= offset {
            return Ok(Bytes::new());
        }

        let block_size = u64::from(self.block_size);
        let first_block = offset / block_size;
        let last_block = (end - 1) / block_size;

        if first_block == last_block {
            let block = self.fetch_block(first_block).await?;
            let start_in_block = (offset - first_block * block_size) as usize;
            let want = (end - offset) as usize;
            return Ok(block.slice(start_in_block..start_in_block + want));
        }

        let mut out = BytesMut::with_capacity((end - offset) as usize);
        for block_idx in first_block..=last_block {
            let block = self.fetch_block(block_idx).await?;
            let block_start = block_idx * block_size;
            let slice_start = offset.max(block_start) - block_start;
            let slice_end = end.min(block_start + block.len() as u64) - block_start;
            out.extend_from_slice(&block[slice_start as usize..slice_end as usize]);
        }
        Ok(out.freeze())
    }

    async fn fetch_block(&self, block_index: u64) -> StorageResult<Bytes> {
        let block_size = u64::from(self.block_size);
        let block_offset = block_index * block_size;
        let want = block_size.min(self.file_len - block_offset);

        let key = BlockKey {
            path: Arc::clone(&self.path),
            block_size: self.block_size,
            block_index,
        };
        let store = Arc::clone(&self.store);
        let path = Arc::clone(&self.path);
        self.cache
            .get_or_fetch(key, move || async move {
                store.read_bytes_range(&path, block_offset, want).await
            })
            .await
    }
}

/// Single-shot stream for backends without range-read support: reads the
/// whole file once and serves slices from memory.
pub struct WholeFileStream {
    bytes: Bytes,
    position: u64,
}

impl WholeFileStream {
    pub fn new(bytes: Bytes) -> Self {
        WholeFileStream { bytes, position: 0 }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn seek(&mut self, position: u64) -> StorageResult<()> {
        self.position = position;
        Ok(())
    }

    pub fn read(&mut self, len: u64) -> StorageResult<Bytes> {
        let start = self.position as usize;
        let end = (start + len as usize).min(self.bytes.len());
        let out = self.bytes.slice(start.min(self.bytes.len())..end);
        self.position += out.len() as u64;
        Ok(out)
    }
}
