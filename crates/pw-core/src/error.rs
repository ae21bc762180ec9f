//! Error types for the worker facade

use project_worker_config::ConfigError;
use project_worker_logging::LogError;
use thiserror::Error;

/// Errors raised by a database session scope
#[derive(Debug, Error)]
pub enum SessionError {
    /// No database backend was configured
    #[error("No database configured: set {setting}")]
    NotConfigured { setting: &'static str },

    /// URL scheme is not one this crate can open
    #[error("Unsupported database URL: {url}")]
    UnsupportedUrl { url: String },

    /// A session was opened while the same thread already holds one on an
    /// in-memory engine
    #[error("Nested session on an in-memory database")]
    Nested,

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Errors that can occur while building or using a worker
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A setting is present but has the wrong type
    #[error("Invalid value for {key}: expected {expected}, got {value}")]
    InvalidSetting {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}
