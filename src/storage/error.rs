//! Storage layer error types.

use std::sync::Arc;
use thiserror::Error;

/// Errors produced by the [`ObjectStore`](crate::storage::ObjectStore)
/// abstraction and the [`FileIO`](crate::storage::FileIO) layer built on
/// top of it.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying `opendal` failure (network, permission, not-found, ...).
    #[error("object store error: {0}")]
    Backend(#[from] opendal::Error),

    /// The backend does not implement this capability (e.g. range reads).
    #[error("operation not supported by this store: {0}")]
    Unsupported(&'static str),

    /// A requested byte range fell outside the file's length.
    #[error("out of bounds read on {path}: requested [{offset}, {offset}+{length}), file is {file_len} bytes")]
    OutOfBounds {
        path: String,
        offset: u64,
        length: u64,
        file_len: u64,
    },

    /// A file was shorter than its recorded length implied.
    #[error("truncated file: {path}")]
    Truncated { path: String },

    /// Arrow decode/encode failure while materializing a batch.
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet decode failure while reading a data file.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// A concurrent fetch for the same block-cache key failed; every
    /// caller waiting on that in-flight fetch observes this shared result
    /// (moka's `try_get_with` dedup semantics).
    #[error("{0}")]
    Shared(Arc<StorageError>),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
