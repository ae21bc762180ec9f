//! Record formatters
//!
//! [`JsonFormatter`] renders one JSON object per record and is what file
//! sinks use. [`MultilineFormatter`] renders human-readable text with
//! indented continuation lines.

mod color;
mod json;
mod multiline;

pub use color::{Color, colorize, level_color};
pub use json::JsonFormatter;
pub use multiline::MultilineFormatter;

use crate::record::LogRecord;
use std::sync::OnceLock;

static HOSTNAME: OnceLock<String> = OnceLock::new();

/// Machine hostname, looked up once per process
pub fn hostname() -> &'static str {
    HOSTNAME.get_or_init(|| {
        ::hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "localhost".to_string())
    })
}

/// Turns a record into one output line (without the trailing newline).
///
/// Formatting never fails: a formatter that cannot render part of a record
/// renders a placeholder instead.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

/// Placeholder used when a record's message cannot be rendered
pub(crate) fn unrepresentable(type_name: &str, error: &std::fmt::Error) -> String {
    format!("<Unrepresentable {type_name:?}: {error}>")
}
