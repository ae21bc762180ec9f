//! Application bootstrap for project-worker services
//!
//! [`ProjectWorker`] resolves layered configuration, sets up structured
//! JSON logging, and exposes transactional database sessions and a pooled
//! HTTP client.
//!
//! ```ignore
//! let worker = ProjectWorker::new("uploader", WorkerOptions::default())?;
//! pw_info!(worker.logger(), "starting with {} keys", worker.config().len());
//! let count = worker.db_session(|s| -> Result<i64, SessionError> {
//!     Ok(s.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?)
//! })?;
//! ```

pub mod db;
mod error;
pub mod http;
mod worker;

pub use db::{DatabaseTarget, Engine, Session};
pub use error::{SessionError, WorkerError};
pub use http::{HttpClient, PoolSettings};
pub use worker::{
    DATABASE_URL_KEY, LEGACY_DATABASE_URL_KEY, LOG_STDOUT_KEY, ProjectWorker, WorkerOptions,
};

pub use project_worker_config as config;
pub use project_worker_logging as logging;
