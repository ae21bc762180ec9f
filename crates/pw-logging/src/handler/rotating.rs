//! Size-based rotating file sink, safe across processes

use super::Handler;
use crate::error::LogError;
use crate::format::{Formatter, JsonFormatter};
use crate::level::Level;
use crate::lock::{acquire_lock, lock_path_for};
use crate::record::LogRecord;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Roll over once a file would reach 10 MiB
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Number of rotated backups kept (`.1` through `.10`)
pub const DEFAULT_BACKUP_COUNT: u32 = 10;

/// Path of the `idx`-th backup of `path` (`worker.log` -> `worker.log.3`)
pub fn rotated_path(path: &Path, idx: u32) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{idx}"));
    PathBuf::from(name)
}

/// Appends formatted records to a file, rotating it by size.
///
/// Each write takes an exclusive lock on a sibling `.<file>.lock`, reopens
/// the file in append mode, rotates if needed, writes one full line and
/// flushes before the lock is released. Any number of processes can point
/// handlers at the same file; lines never interleave and rotation happens
/// exactly once per threshold crossing.
pub struct RotatingFileHandler {
    path: PathBuf,
    lock_path: PathBuf,
    max_bytes: u64,
    backup_count: u32,
    level: Option<Level>,
    formatter: Box<dyn Formatter>,
}

impl RotatingFileHandler {
    /// Open a handler on `path` with the default limits, creating the file
    pub fn open(
        path: impl Into<PathBuf>,
        formatter: impl Formatter + 'static,
    ) -> Result<Self, LogError> {
        let path = path.into();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LogError::File {
                path: path.clone(),
                source: e,
            })?;

        Ok(Self {
            lock_path: lock_path_for(&path),
            path,
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
            level: None,
            formatter: Box::new(formatter),
        })
    }

    /// Open with the default JSON formatter
    pub fn json(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        Self::open(path, JsonFormatter::new(false))
    }

    /// Set rotation limits; `max_bytes == 0` or `backup_count == 0` disables
    /// rotation
    pub fn with_limits(mut self, max_bytes: u64, backup_count: u32) -> Self {
        self.max_bytes = max_bytes;
        self.backup_count = backup_count;
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn backup_count(&self) -> u32 {
        self.backup_count
    }

    fn should_rollover(&self, incoming: u64) -> Result<bool, LogError> {
        if self.max_bytes == 0 || self.backup_count == 0 {
            return Ok(false);
        }
        let size = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => {
                return Err(LogError::File {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        // An empty file is never rotated, even for an oversized line
        Ok(size > 0 && size + incoming >= self.max_bytes)
    }

    fn rollover(&self) -> Result<(), LogError> {
        let oldest = rotated_path(&self.path, self.backup_count);
        if oldest.exists() {
            fs::remove_file(&oldest).map_err(|e| LogError::File {
                path: oldest.clone(),
                source: e,
            })?;
        }
        for idx in (1..self.backup_count).rev() {
            let src = rotated_path(&self.path, idx);
            if src.exists() {
                let dst = rotated_path(&self.path, idx + 1);
                fs::rename(&src, &dst).map_err(|e| LogError::File {
                    path: src.clone(),
                    source: e,
                })?;
            }
        }
        fs::rename(&self.path, rotated_path(&self.path, 1)).map_err(|e| LogError::File {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl Handler for RotatingFileHandler {
    fn emit(&self, record: &LogRecord) -> Result<(), LogError> {
        let mut line = self.formatter.format(record);
        line.push('\n');

        let _lock = acquire_lock(&self.lock_path)?;

        if self.should_rollover(line.len() as u64)? {
            self.rollover()?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LogError::File {
                path: self.path.clone(),
                source: e,
            })?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| LogError::File {
                path: self.path.clone(),
                source: e,
            })
    }

    fn level(&self) -> Option<Level> {
        self.level
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn describe(&self) -> String {
        format!("RotatingFileHandler({})", self.path.display())
    }
}
