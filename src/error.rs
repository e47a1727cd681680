//! Top-level error type for the query engine.
//!
//! Every module defines its own `thiserror` error enum for the failures it
//! can produce (`ConfigError`, `storage::StorageError`,
//! `r2rml::R2RMLError`, ...). `EngineError` wraps each of those as a
//! variant so callers crossing a module boundary deal with one type, per
//! the error-kind taxonomy in the design: config, catalog, IO, schema,
//! planning, execution, timeout.

use std::collections::HashMap;
use thiserror::Error;

use crate::config::ConfigError;
use crate::execution::{ResourceError, TimeoutError};
use crate::r2rml::R2RMLError;
use crate::storage::StorageError;

/// Structured context attached to an [`EngineError`], e.g. the table or
/// column a `SchemaError` was raised for.
pub type ErrorContext = HashMap<String, String>;

/// The single error type returned across module boundaries.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Missing/invalid R2RML, missing `tableName`, malformed template.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// R2RML document could not be parsed into mappings.
    #[error("r2rml error: {0}")]
    R2RML(#[from] R2RMLError),

    /// Metadata location not resolvable, catalog unreachable.
    #[error("catalog error: {message}")]
    Catalog {
        message: String,
        context: ErrorContext,
    },

    /// Storage read failure, out-of-bounds seek, truncated file.
    #[error("io error: {0}")]
    Io(#[from] StorageError),

    /// Query references an unknown predicate IRI, unknown table, or
    /// column not present in the resolved schema.
    #[error("schema error: {message}")]
    Schema {
        message: String,
        context: ErrorContext,
    },

    /// Disconnected join graph (unreachable table in a multi-pattern
    /// query) when no Cartesian fallback is enabled.
    #[error("planning error: {message}")]
    Planning {
        message: String,
        context: ErrorContext,
    },

    /// Arrow decode error on a specific column/row, allocator failure,
    /// invariant violation.
    #[error("execution error: {message}")]
    Execution {
        message: String,
        context: ErrorContext,
    },

    /// A caller-imposed resource limit was exceeded.
    #[error("resource limit: {0}")]
    Resource(#[from] ResourceError),

    /// A caller-imposed deadline was exceeded.
    #[error("timeout: {0}")]
    Timeout(#[from] TimeoutError),
}

impl EngineError {
    pub fn schema(message: impl Into<String>) -> Self {
        EngineError::Schema {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn planning(message: impl Into<String>) -> Self {
        EngineError::Planning {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        EngineError::Execution {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        EngineError::Catalog {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    /// Attach a `(key, value)` pair of context to a variant that carries
    /// one. No-op for variants without a context field.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = match &mut self {
            EngineError::Catalog { context, .. }
            | EngineError::Schema { context, .. }
            | EngineError::Planning { context, .. }
            | EngineError::Execution { context, .. } => Some(context),
            _ => None,
        };
        if let Some(ctx) = ctx {
            ctx.insert(key.into(), value.into());
        }
        self
    }
}

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;
