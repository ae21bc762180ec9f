//! Plain-text formatter for terminals

use super::{Formatter, unrepresentable};
use crate::record::LogRecord;
use crate::time::format_record_time;

const CONTINUATION: &str = "\n     ";

/// Plain-text formatter for human readers.
///
/// Renders `"{asctime} {level} [{module}:{lineno}] {message}"`; every line
/// after the first is indented so continuation lines stand apart from the
/// start of the next record.
#[derive(Debug, Clone, Default)]
pub struct MultilineFormatter {
    datefmt: Option<String>,
}

impl MultilineFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_datefmt(mut self, datefmt: &str) -> Self {
        self.datefmt = Some(datefmt.to_string());
        self
    }
}

impl Formatter for MultilineFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let message = record
            .message
            .render()
            .unwrap_or_else(|err| unrepresentable(record.message.type_name(), &err));

        let mut text = message;
        if let Some(exception) = &record.exception {
            text.push_str(&format!("\n{}: {}", exception.kind, exception.message));
            for cause in &exception.causes {
                text.push_str(&format!("\ncaused by: {cause}"));
            }
        }

        format!(
            "{} {} [{}:{}] {}",
            format_record_time(&record.created, self.datefmt.as_deref()),
            record.level,
            record.module,
            record.lineno,
            text.lines().collect::<Vec<_>>().join(CONTINUATION)
        )
    }
}
