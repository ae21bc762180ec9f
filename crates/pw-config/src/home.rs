//! Project home resolution
//!
//! Finds the root directory of the consuming application by walking upward
//! from a starting directory and looking for marker files.
//!
//! # Precedence
//!
//! 1. Upward walk from the starting directory (default: current working directory)
//! 2. Upward walk from the [`RootAnchor`] directory
//! 3. The anchor directory itself, with a diagnostic on stderr
//!
//! Each walk checks at most [`DEFAULT_MAX_LEVELS`] directories: the start,
//! its parent and its grandparent.
//!
//! # Usage
//!
//! ```no_run
//! use project_worker_config::home::{locate_project_root, RootAnchor};
//!
//! # fn example() -> Result<(), project_worker_config::ConfigError> {
//! let anchor = RootAnchor::Path(env!("CARGO_MANIFEST_DIR").into());
//! let root = locate_project_root(None, &anchor)?;
//! println!("Project home: {}", root.path.display());
//! # Ok(())
//! # }
//! ```

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Marker files whose presence identifies a project root: the dependency
/// lock file and the project manifest.
pub const DEFAULT_MARKERS: [&str; 2] = ["Cargo.lock", "Cargo.toml"];

/// Number of directories inspected per walk (start, parent, grandparent)
pub const DEFAULT_MAX_LEVELS: usize = 3;

/// Location used when the working directory is not inside a project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RootAnchor {
    /// Directory containing the running executable
    #[default]
    Executable,
    /// Explicit location, typically known at compile time
    /// (e.g. `env!("CARGO_MANIFEST_DIR")`). A file path anchors at its parent.
    Path(PathBuf),
}

impl RootAnchor {
    /// Resolve the anchor to an absolute directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AnchorUnavailable`] when the executable path
    /// cannot be determined or has no parent directory.
    pub fn dir(&self) -> Result<PathBuf, ConfigError> {
        match self {
            RootAnchor::Path(path) => {
                let path = std::path::absolute(path)?;
                if path.is_file() {
                    parent_of(&path)
                } else {
                    Ok(path)
                }
            }
            RootAnchor::Executable => {
                let exe = std::env::current_exe().map_err(|e| ConfigError::AnchorUnavailable {
                    reason: format!("cannot locate current executable: {e}"),
                })?;
                parent_of(&exe)
            }
        }
    }
}

fn parent_of(path: &Path) -> Result<PathBuf, ConfigError> {
    path.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ConfigError::AnchorUnavailable {
            reason: format!("{} has no parent directory", path.display()),
        })
}

/// How a project root was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSource {
    /// A marker file was found while walking up from the starting directory
    Start,
    /// A marker file was found while walking up from the anchor
    Anchor,
    /// No marker file was found; the anchor directory is used as-is
    Fallback,
}

/// Result of project root discovery
#[derive(Debug, Clone)]
pub struct ProjectRoot {
    /// Absolute project home
    pub path: PathBuf,
    /// Which stage of the search produced `path`
    pub source: RootSource,
    /// Diagnostics written to stderr along the way
    pub diagnostics: Vec<String>,
}

/// Marker-file search configuration
#[derive(Debug, Clone)]
pub struct RootLocator {
    markers: Vec<String>,
    max_levels: usize,
}

impl Default for RootLocator {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
            max_levels: DEFAULT_MAX_LEVELS,
        }
    }
}

impl RootLocator {
    /// Create a locator looking for custom marker files
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Walk upward from `start`, returning the first directory that holds
    /// any marker file.
    pub fn swim_up(&self, start: &Path) -> Option<PathBuf> {
        let mut dir = start;
        for _ in 0..self.max_levels {
            if self.markers.iter().any(|marker| dir.join(marker).exists()) {
                return Some(dir.to_path_buf());
            }
            dir = dir.parent()?;
        }
        None
    }

    /// Resolve the project home.
    ///
    /// `start` defaults to the current working directory. When neither the
    /// start nor the anchor lead to a marker file, the anchor directory is
    /// returned and a diagnostic is written to stderr.
    pub fn locate(
        &self,
        start: Option<&Path>,
        anchor: &RootAnchor,
    ) -> Result<ProjectRoot, ConfigError> {
        let start = match start {
            Some(path) => std::path::absolute(path)?,
            None => std::env::current_dir()?,
        };

        if let Some(path) = self.swim_up(&start) {
            return Ok(ProjectRoot {
                path,
                source: RootSource::Start,
                diagnostics: Vec::new(),
            });
        }

        let mut diagnostics = vec![format!(
            "Couldn't identify project root from: {}. Going to inspect the anchor next",
            start.display()
        )];
        eprintln!("Warning: {}", diagnostics[0]);

        let anchor_dir = anchor.dir()?;
        if let Some(path) = self.swim_up(&anchor_dir) {
            return Ok(ProjectRoot {
                path,
                source: RootSource::Anchor,
                diagnostics,
            });
        }

        let message = format!(
            "Can't find the project home; returning the anchor location: {}",
            anchor_dir.display()
        );
        eprintln!("Warning: {message}");
        diagnostics.push(message);

        Ok(ProjectRoot {
            path: anchor_dir,
            source: RootSource::Fallback,
            diagnostics,
        })
    }
}

/// Resolve the project home with the default markers.
pub fn locate_project_root(
    start: Option<&Path>,
    anchor: &RootAnchor,
) -> Result<ProjectRoot, ConfigError> {
    RootLocator::default().locate(start, anchor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_marker_two_levels_up() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("proj");
        let start = root.join("src").join("bin");
        fs::create_dir_all(&start).unwrap();
        fs::write(root.join("Cargo.toml"), "[package]\n").unwrap();

        let found = locate_project_root(Some(&start), &RootAnchor::Executable).unwrap();
        assert_eq!(found.path, root);
        assert_eq!(found.source, RootSource::Start);
        assert!(found.diagnostics.is_empty());
    }

    #[test]
    fn test_lock_file_is_a_marker() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Cargo.lock"), "").unwrap();

        let found = RootLocator::default().swim_up(temp_dir.path());
        assert_eq!(found.as_deref(), Some(temp_dir.path()));
    }

    #[test]
    fn test_marker_out_of_range() {
        let temp_dir = TempDir::new().unwrap();
        let start = temp_dir.path().join("a").join("b").join("c");
        fs::create_dir_all(&start).unwrap();
        // Three levels above the start is one too many
        fs::write(temp_dir.path().join("Cargo.toml"), "").unwrap();

        assert!(RootLocator::default().swim_up(&start).is_none());
    }

    #[test]
    fn test_falls_back_to_anchor_search() {
        let temp_dir = TempDir::new().unwrap();
        let start = temp_dir.path().join("work").join("x").join("y");
        let anchor_root = temp_dir.path().join("anchored");
        let anchor_dir = anchor_root.join("target");
        fs::create_dir_all(&start).unwrap();
        fs::create_dir_all(&anchor_dir).unwrap();
        fs::write(anchor_root.join("Cargo.lock"), "").unwrap();

        let found = locate_project_root(Some(&start), &RootAnchor::Path(anchor_dir)).unwrap();
        assert_eq!(found.path, anchor_root);
        assert_eq!(found.source, RootSource::Anchor);
        assert_eq!(found.diagnostics.len(), 1);
    }

    #[test]
    fn test_no_marker_returns_anchor_with_diagnostic() {
        let temp_dir = TempDir::new().unwrap();
        let start = temp_dir.path().join("a").join("b").join("c");
        let anchor_dir = temp_dir.path().join("d").join("e").join("f");
        fs::create_dir_all(&start).unwrap();
        fs::create_dir_all(&anchor_dir).unwrap();

        let found =
            locate_project_root(Some(&start), &RootAnchor::Path(anchor_dir.clone())).unwrap();
        assert_eq!(found.path, anchor_dir);
        assert_eq!(found.source, RootSource::Fallback);
        assert_eq!(found.diagnostics.len(), 2);
        assert!(found.diagnostics[1].contains("Can't find the project home"));
    }

    #[test]
    fn test_file_anchor_uses_parent() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("main.rs");
        fs::write(&file, "fn main() {}").unwrap();

        let dir = RootAnchor::Path(file).dir().unwrap();
        assert_eq!(dir, temp_dir.path());
    }

    #[test]
    fn test_custom_markers() {
        let temp_dir = TempDir::new().unwrap();
        let start = temp_dir.path().join("pkg");
        fs::create_dir_all(&start).unwrap();
        fs::write(temp_dir.path().join("pyproject.toml"), "").unwrap();

        let locator = RootLocator::with_markers(["requirements.txt", "pyproject.toml"]);
        assert_eq!(locator.swim_up(&start).as_deref(), Some(temp_dir.path()));
        assert!(RootLocator::default().swim_up(&start).is_none());
    }
}
