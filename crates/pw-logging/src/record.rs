//! Log records

use crate::level::Level;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::{self, Write};
use std::panic::{self, AssertUnwindSafe, Location};
use std::path::Path;
use std::sync::{Arc, OnceLock};

static PROCESS_NAME: OnceLock<String> = OnceLock::new();

/// Name of the running process, derived once from the executable name
pub fn process_name() -> &'static str {
    PROCESS_NAME.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "main".to_string())
    })
}

fn current_thread_name() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}

/// Source location of a logging call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub function: &'static str,
}

impl CallSite {
    pub const UNKNOWN_FUNCTION: &'static str = "<unknown>";

    pub const fn new(file: &'static str, line: u32, function: &'static str) -> Self {
        Self {
            file,
            line,
            function,
        }
    }

    /// Call site from a `#[track_caller]` location; the function is unknown.
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line(), Self::UNKNOWN_FUNCTION)
    }
}

/// Reduce a `type_name` of a nested item to the enclosing function's name.
///
/// `my_crate::handlers::run::__pw_f` becomes `run`; closure segments are
/// skipped so a call inside a closure reports the function around it.
#[doc(hidden)]
pub fn trim_function_name(type_name: &'static str) -> &'static str {
    let mut name = type_name.strip_suffix("::__pw_f").unwrap_or(type_name);
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    name.rsplit("::").next().unwrap_or(name)
}

/// Run a write into a fresh string, turning a panic into `fmt::Error`
fn write_guarded<F>(write: F) -> Result<String, fmt::Error>
where
    F: FnOnce(&mut String) -> fmt::Result,
{
    let mut out = String::new();
    match panic::catch_unwind(AssertUnwindSafe(|| write(&mut out))) {
        Ok(Ok(())) => Ok(out),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(fmt::Error),
    }
}

#[derive(Clone)]
enum MessageRepr {
    Text(String),
    Display {
        value: Arc<dyn fmt::Display + Send + Sync>,
        type_name: &'static str,
    },
    /// Formatting already failed when the message was built
    Failed { type_name: &'static str },
}

/// The message of a log record.
///
/// Usually plain text, but any `Display` value can be logged; it is only
/// rendered when a formatter needs it, and rendering may fail.
#[derive(Clone)]
pub struct Message(MessageRepr);

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Message(MessageRepr::Text(text.into()))
    }

    /// Wrap a value that is rendered lazily through its `Display` impl
    pub fn display<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Message(MessageRepr::Display {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Build a message from `format_args!` output without panicking when a
    /// `Display` impl inside the arguments fails or panics.
    pub fn from_args(args: fmt::Arguments<'_>) -> Self {
        if let Some(text) = args.as_str() {
            return Message::text(text);
        }
        match write_guarded(|out| out.write_fmt(args)) {
            Ok(out) => Message(MessageRepr::Text(out)),
            Err(_) => Message(MessageRepr::Failed {
                type_name: std::any::type_name::<fmt::Arguments<'_>>(),
            }),
        }
    }

    /// Render the message text.
    ///
    /// A `Display` impl that panics is reported as a formatting error.
    pub fn render(&self) -> Result<String, fmt::Error> {
        match &self.0 {
            MessageRepr::Text(text) => Ok(text.clone()),
            MessageRepr::Display { value, .. } => write_guarded(|out| write!(out, "{value}")),
            MessageRepr::Failed { .. } => Err(fmt::Error),
        }
    }

    /// Type of the logged value
    pub fn type_name(&self) -> &'static str {
        match &self.0 {
            MessageRepr::Text(_) => std::any::type_name::<String>(),
            MessageRepr::Display { type_name, .. } | MessageRepr::Failed { type_name } => {
                *type_name
            }
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            MessageRepr::Text(text) => f.debug_tuple("Message").field(text).finish(),
            MessageRepr::Display { type_name, .. } | MessageRepr::Failed { type_name } => {
                f.debug_tuple("Message").field(type_name).finish()
            }
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::text(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::text(text)
    }
}

/// Structured description of an error attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    /// `Display` output of each `source()` in the chain, outermost first
    pub causes: Vec<String>,
}

impl ExceptionInfo {
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            kind: std::any::type_name::<E>().to_string(),
            message: error.to_string(),
            causes,
        }
    }
}

/// One log event
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Name of the logger that produced the record
    pub name: String,
    pub level: Level,
    pub message: Message,
    pub created: DateTime<Utc>,
    /// File name of the call site, without directories
    pub filename: String,
    pub lineno: u32,
    pub func_name: String,
    /// File stem of the call site
    pub module: String,
    pub thread_name: String,
    pub process_name: String,
    pub exception: Option<ExceptionInfo>,
    /// Open-ended extra fields, rendered after the standard ones
    pub extra: Map<String, Value>,
}

impl LogRecord {
    /// Create a record stamped with the current time, thread and process
    pub fn new(name: &str, level: Level, message: Message, site: CallSite) -> Self {
        let path = Path::new(site.file);
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| site.file.to_string());
        let module = path
            .file_stem()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.clone());

        Self {
            name: name.to_string(),
            level,
            message,
            created: Utc::now(),
            filename,
            lineno: site.line,
            func_name: site.function.to_string(),
            module,
            thread_name: current_thread_name(),
            process_name: process_name().to_string(),
            exception: None,
            extra: Map::new(),
        }
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }
}
