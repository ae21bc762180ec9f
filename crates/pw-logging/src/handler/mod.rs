//! Log sinks

mod rotating;
mod stream;

pub use rotating::{DEFAULT_BACKUP_COUNT, DEFAULT_MAX_BYTES, RotatingFileHandler, rotated_path};
pub use stream::{StreamHandler, StreamTarget};

use crate::error::LogError;
use crate::level::Level;
use crate::record::LogRecord;
use std::path::Path;

/// Destination for formatted records.
///
/// Handlers own their formatter and an optional minimum level. They are
/// shared between threads behind `Arc`, so emission takes `&self`.
pub trait Handler: Send + Sync {
    /// Format and write one record
    fn emit(&self, record: &LogRecord) -> Result<(), LogError>;

    /// Records below this level are skipped by the logger
    fn level(&self) -> Option<Level> {
        None
    }

    /// File this handler writes to, if any
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Short description used in diagnostics
    fn describe(&self) -> String;
}
