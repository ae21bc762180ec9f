//! Structured JSON logging for project-worker applications
//!
//! - [`setup_logging`] attaches a rotating JSON file sink (and optionally
//!   stdout) to a named logger
//! - [`RotatingFileHandler`] keeps one file safe to share between processes
//! - [`JsonFormatter`] renders one JSON object per line, including multiline
//!   messages, and never fails on a message that cannot be rendered
//! - [`get_date`] and [`date_to_solr_stamp`] handle UTC timestamps
//!
//! ```ignore
//! let mut ctx = ProjectContext::new();
//! let registry = LoggerRegistry::new();
//! let logger = setup_logging(&mut ctx, &registry, &LoggingOptions::new("worker"))?;
//! pw_info!(logger, "processed {} items", count);
//! ```

pub mod diagnostics;
mod error;
pub mod format;
pub mod handler;
mod level;
pub mod lock;
pub mod logger;
mod macros;
pub mod record;
pub mod setup;
pub mod time;

pub use error::LogError;
pub use format::{Formatter, JsonFormatter, MultilineFormatter};
pub use handler::{Handler, RotatingFileHandler, StreamHandler};
pub use level::Level;
pub use logger::{Logger, LoggerRegistry};
pub use record::{CallSite, ExceptionInfo, LogRecord, Message};
pub use setup::{LoggingOptions, log_file_name, setup_logging};
pub use time::{DateParseError, date_to_solr_stamp, get_date};
