//! Configuration resolution
//!
//! Resolves configuration from multiple sources with priority:
//! 1. App-prefixed environment variables (`<APP>_<KEY>`)
//! 2. Bare environment variables (`<KEY>`)
//! 3. Project-local overrides (`local_config.toml`)
//! 4. Project config (`config.toml`)

mod env;
pub mod literal;
mod loader;
mod types;

pub use env::{coerce_env_value, normalize_app_name, update_from_env, update_from_source};
pub use loader::{
    BASE_CONFIG_FILE, LOCAL_CONFIG_FILE, LoadOptions, load_config, load_module, resolve_proj_home,
};
pub use types::{ConfigMap, PROJ_HOME_KEY, SERVICE_KEY, is_config_key};
