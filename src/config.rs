//! Configuration system.
//!
//! Hierarchical configuration loading from:
//! - `icegraph.toml` (base configuration)
//! - `icegraph.local.toml` (git-ignored local overrides)
//! - Environment variables (`ICEGRAPH_*` prefix)
//!
//! ## Example
//!
//! ```toml
//! # icegraph.toml
//! warehouse_path = "s3://lake/warehouse"
//! block_size = 4194304
//! cache_max_bytes = 268435456
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! ICEGRAPH_WAREHOUSE_PATH=/custom/path
//! ICEGRAPH_CACHE_MAX_BYTES=536870912
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Recognized engine options (spec §6.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix for resolving Iceberg metadata paths.
    pub warehouse_path: String,

    /// Block size for range reads, in bytes.
    pub block_size: u32,

    /// Block cache capacity, in bytes.
    pub cache_max_bytes: u64,

    /// Block cache access TTL, in minutes.
    pub cache_ttl_minutes: u32,

    /// BFS depth cap for transitive property paths.
    pub transitive_depth_limit: u32,

    /// Default Arrow batch size for scans.
    pub default_batch_size: u32,

    /// Whether scans copy batches (independent ownership) by default.
    pub copy_batches: bool,

    /// Whether to compute per-class column sketches during indexing.
    pub track_class_stats: bool,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration: level and output format for the `tracing`
/// subscriber installed by [`init_tracing`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `RUST_LOG`-style filter directive, e.g. `"icegraph=debug,warn"`.
    pub filter: String,
    /// `"text"` or `"json"`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            warehouse_path: String::new(),
            block_size: 4 * 1024 * 1024,
            cache_max_bytes: 256 * 1024 * 1024,
            cache_ttl_minutes: 5,
            transitive_depth_limit: 100,
            default_batch_size: 4096,
            copy_batches: true,
            track_class_stats: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default locations, merging
    /// `icegraph.toml`, then `icegraph.local.toml`, then `ICEGRAPH_*`
    /// environment variables, on top of [`EngineConfig::default`].
    pub fn load() -> Result<Self, ConfigError> {
        Figment::from(figment::providers::Serialized::defaults(
            EngineConfig::default(),
        ))
        .merge(Toml::file("icegraph.toml"))
        .merge(Toml::file("icegraph.local.toml"))
        .merge(Env::prefixed("ICEGRAPH_"))
        .extract()
        .map_err(ConfigError::Load)
    }

    /// Load configuration from a specific file path, still honoring
    /// environment overrides.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Figment::from(figment::providers::Serialized::defaults(
            EngineConfig::default(),
        ))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ICEGRAPH_"))
        .extract()
        .map_err(ConfigError::Load)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::Invalid("block_size must be > 0".into()));
        }
        if self.default_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "default_batch_size must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Install a global `tracing` subscriber from [`LoggingConfig`]. Safe to
/// call more than once; subsequent calls are no-ops.
pub fn init_tracing(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);

    let result = if config.format == "json" {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
