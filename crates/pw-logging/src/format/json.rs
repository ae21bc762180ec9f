//! JSON line formatter

use super::color::{colorize, level_color};
use super::{Formatter, hostname, unrepresentable};
use crate::record::{ExceptionInfo, LogRecord};
use crate::time::{TIMESTAMP_FMT, format_record_time};
use serde_json::{Map, Value};

/// Keys produced for every record; record extras never overwrite them
/// (formatter extras are protected as well)
const RESERVED_KEYS: [&str; 13] = [
    "asctime",
    "name",
    "processName",
    "filename",
    "funcName",
    "levelname",
    "lineno",
    "module",
    "threadName",
    "message",
    "exc_info",
    "timestamp",
    "hostname",
];

/// Renders each record as a single JSON object.
///
/// Newlines inside the message are escaped by the JSON encoding, so a
/// multiline message still produces exactly one line. Every instance carries
/// the process hostname in its extras.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    use_color: bool,
    extra: Map<String, Value>,
    datefmt: Option<String>,
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl JsonFormatter {
    /// Create a formatter; `use_color` wraps whole lines in ANSI colors and
    /// is meant for terminals only.
    pub fn new(use_color: bool) -> Self {
        let mut extra = Map::new();
        extra.insert("hostname".to_string(), Value::from(hostname()));
        Self {
            use_color,
            extra,
            datefmt: Some(TIMESTAMP_FMT.to_string()),
        }
    }

    /// Override the time format; `None` selects RFC 3339 with milliseconds
    pub fn with_datefmt(mut self, datefmt: Option<&str>) -> Self {
        self.datefmt = datefmt.map(str::to_string);
        self
    }

    /// Add a field rendered into every record
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn render(
        &self,
        record: &LogRecord,
        message: String,
        exception: Option<&ExceptionInfo>,
    ) -> String {
        let asctime = format_record_time(&record.created, self.datefmt.as_deref());

        let mut obj = Map::new();
        obj.insert("asctime".to_string(), Value::from(asctime.clone()));
        obj.insert("name".to_string(), Value::from(record.name.as_str()));
        obj.insert("processName".to_string(), Value::from(record.process_name.as_str()));
        obj.insert("filename".to_string(), Value::from(record.filename.as_str()));
        obj.insert("funcName".to_string(), Value::from(record.func_name.as_str()));
        obj.insert("levelname".to_string(), Value::from(record.level.as_str()));
        obj.insert("lineno".to_string(), Value::from(record.lineno));
        obj.insert("module".to_string(), Value::from(record.module.as_str()));
        obj.insert("threadName".to_string(), Value::from(record.thread_name.as_str()));
        obj.insert("message".to_string(), Value::from(message));
        if let Some(exception) = exception {
            obj.insert(
                "exc_info".to_string(),
                serde_json::to_value(exception).unwrap_or(Value::Null),
            );
        }
        obj.insert("timestamp".to_string(), Value::from(asctime));
        for (key, value) in &self.extra {
            obj.insert(key.clone(), value.clone());
        }
        for (key, value) in &record.extra {
            if !RESERVED_KEYS.contains(&key.as_str()) && !obj.contains_key(key) {
                obj.insert(key.clone(), value.clone());
            }
        }

        Value::Object(obj).to_string()
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let line = match record.message.render() {
            Ok(message) => self.render(record, message, record.exception.as_ref()),
            Err(err) => {
                // Render a stand-in; `record` itself is untouched for other handlers
                let placeholder = unrepresentable(record.message.type_name(), &err);
                let failure = ExceptionInfo::from_error(&err);
                self.render(record, placeholder, Some(&failure))
            }
        };

        match level_color(record.level) {
            Some(color) if self.use_color => colorize(&line, color),
            _ => line,
        }
    }
}
