//! Cross-process file locking for log sinks

use crate::error::LogError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive advisory lock, released on drop
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock too; unlock explicitly so
        // the release does not depend on drop order of the handle.
        let _ = FileExt::unlock(&self.file);
    }
}

/// Path of the lock file that guards `target`: `<dir>/.<file name>.lock`
pub fn lock_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.lock"))
}

/// Acquire an exclusive lock on `path`, blocking until it is available.
///
/// The lock file is created if missing and never removed, so every process
/// contends on the same inode.
pub fn acquire_lock(path: &Path) -> Result<FileLock, LogError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| LogError::Lock {
            path: path.to_path_buf(),
            source: e,
        })?;

    file.lock_exclusive().map_err(|e| LogError::Lock {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(FileLock {
        file,
        path: path.to_path_buf(),
    })
}
