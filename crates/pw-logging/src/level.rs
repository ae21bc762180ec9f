//! Log levels

use crate::error::LogError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Severity of a log record, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Debug = 10,
    Info = 20,
    Warning = 30,
    Error = 40,
    Critical = 50,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    /// Numeric severity (10 for DEBUG through 50 for CRITICAL)
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LogError;

    /// Accepts level names case-insensitively, the `WARN` and `FATAL`
    /// aliases, and numeric severities.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" | "10" => Ok(Level::Debug),
            "INFO" | "20" => Ok(Level::Info),
            "WARNING" | "WARN" | "30" => Ok(Level::Warning),
            "ERROR" | "40" => Ok(Level::Error),
            "CRITICAL" | "FATAL" | "50" => Ok(Level::Critical),
            _ => Err(LogError::InvalidLevel {
                level: s.to_string(),
            }),
        }
    }
}
