//! Agent error types.

use std::path::PathBuf;
use thiserror::Error;

/// Agent errors.
///
/// These are startup and I/O failures. Per-request failures never show up
/// here; they come back as failed `DispatchResult`s.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The config file given with `--config` does not exist.
    #[error("config file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration is invalid or could not be read.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// The tool registry could not be built.
    #[error("tool registration failed: {0}")]
    Registry(#[from] dispatch::ConfigError),

    /// Failed to serialize output.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
