//! Error types for logging setup and emission

use project_worker_config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while configuring or writing logs
#[derive(Debug, Error)]
pub enum LogError {
    /// I/O error without a specific path
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error on a log file or its rotated backups
    #[error("I/O error on {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to take the cross-process lock guarding a log file
    #[error("Failed to acquire lock on {path}: {source}")]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Config resolution failed while looking up logging defaults
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Level name is not one of DEBUG, INFO, WARNING, ERROR, CRITICAL
    #[error("Unknown logging level: {level}")]
    InvalidLevel { level: String },
}
