//! Handler writing to stdout or stderr

use super::Handler;
use crate::error::LogError;
use crate::format::{Formatter, JsonFormatter};
use crate::level::Level;
use crate::record::LogRecord;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTarget {
    Stdout,
    Stderr,
}

/// Writes formatted records to stdout or stderr
pub struct StreamHandler {
    target: StreamTarget,
    level: Option<Level>,
    formatter: Box<dyn Formatter>,
}

impl StreamHandler {
    pub fn new(target: StreamTarget, formatter: impl Formatter + 'static) -> Self {
        Self {
            target,
            level: None,
            formatter: Box::new(formatter),
        }
    }

    /// Standard output with its own JSON formatter
    pub fn stdout(use_color: bool) -> Self {
        Self::new(StreamTarget::Stdout, JsonFormatter::new(use_color))
    }

    pub fn stderr(use_color: bool) -> Self {
        Self::new(StreamTarget::Stderr, JsonFormatter::new(use_color))
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn target(&self) -> StreamTarget {
        self.target
    }
}

impl Handler for StreamHandler {
    fn emit(&self, record: &LogRecord) -> Result<(), LogError> {
        let line = self.formatter.format(record);
        match self.target {
            StreamTarget::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{line}")?;
                out.flush()?;
            }
            StreamTarget::Stderr => {
                let mut out = io::stderr().lock();
                writeln!(out, "{line}")?;
                out.flush()?;
            }
        }
        Ok(())
    }

    fn level(&self) -> Option<Level> {
        self.level
    }

    fn describe(&self) -> String {
        format!("StreamHandler({:?})", self.target)
    }
}
