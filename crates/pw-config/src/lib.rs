//! Layered configuration resolution for project-worker applications
//!
//! Resolution runs once at startup:
//! - [`home`] finds the project root via marker files
//! - [`config`] loads `config.toml` and `local_config.toml` from it and
//!   overlays environment variables
//!
//! All keys in a resolved [`ConfigMap`] are uppercase.

pub mod config;
pub mod context;
mod error;
pub mod home;

pub use config::{ConfigMap, LoadOptions, load_config, load_module};
pub use context::ProjectContext;
pub use error::ConfigError;
pub use home::{ProjectRoot, RootAnchor, RootLocator, RootSource, locate_project_root};
