//! Startup context
//!
//! Process-level state that config resolution would otherwise keep in
//! globals. Construct one at startup and pass it to every call that needs it.

use std::path::{Path, PathBuf};

/// Project context resolved at startup
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    search_path: Vec<PathBuf>,
}

impl ProjectContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `path` to the search path unless it is already present.
    ///
    /// Returns true when the path was added.
    pub fn register_search_path(&mut self, path: &Path) -> bool {
        if self.search_path.iter().any(|p| p == path) {
            return false;
        }
        self.search_path.push(path.to_path_buf());
        true
    }

    /// Directories registered by config resolution, in registration order
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }
}
