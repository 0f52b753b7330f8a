//! Crate-wide error taxonomy

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the cache, synchronizer, tag reader, and watcher
#[derive(Debug, Error)]
pub enum Error {
    #[error("{path}: unsupported audio format")]
    UnsupportedFormat { path: PathBuf },

    #[error("{path}: unsupported tag value type ({detail})")]
    UnsupportedTagValueType { path: PathBuf, detail: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-specific failures, terminal at process startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {0}")]
    NotFound(PathBuf),

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("io error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
