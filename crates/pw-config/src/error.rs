//! Error types for configuration resolution

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error without a specific path (e.g. reading the working directory)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read a config source that exists
    #[error("I/O error on {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Config source is not valid TOML
    #[error("TOML parsing error in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Explicitly supplied project home does not exist
    #[error("{path} doesn't exist")]
    MissingProjectHome { path: PathBuf },

    /// The anchor used for root discovery could not be resolved
    #[error("Unable to determine anchor location: {reason}")]
    AnchorUnavailable { reason: String },
}
