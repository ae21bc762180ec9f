//! Config source loading and resolution

use super::env::update_from_env;
use super::types::{ConfigMap, PROJ_HOME_KEY, SERVICE_KEY};
use crate::context::ProjectContext;
use crate::error::ConfigError;
use crate::home::{RootAnchor, locate_project_root};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Base config file, relative to the project home
pub const BASE_CONFIG_FILE: &str = "config.toml";

/// Local override file, relative to the project home
pub const LOCAL_CONFIG_FILE: &str = "local_config.toml";

/// Options for [`load_config`]
#[derive(Debug, Default, Clone)]
pub struct LoadOptions {
    /// Explicit project home; must exist. Discovered when `None`.
    pub proj_home: Option<PathBuf>,
    /// Where root discovery falls back to when the working directory is not
    /// inside a project
    pub anchor: RootAnchor,
    /// Env prefix; defaults to the loaded `SERVICE` value
    pub app_name: Option<String>,
}

/// Load one config source.
///
/// A missing file contributes nothing. A file that exists but is not valid
/// TOML is an error. Only top-level uppercase keys are kept; nested arrays
/// and tables are preserved as-is.
pub fn load_module(path: &Path) -> Result<ConfigMap, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ConfigMap::new()),
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let table: toml::Table = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(table
        .into_iter()
        .map(|(key, value)| (key, toml_to_json(value)))
        .collect())
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

/// Resolve the project home for `options` without loading anything.
pub fn resolve_proj_home(options: &LoadOptions) -> Result<PathBuf, ConfigError> {
    match &options.proj_home {
        Some(path) => {
            let path = std::path::absolute(path)?;
            if !path.exists() {
                return Err(ConfigError::MissingProjectHome { path });
            }
            Ok(path)
        }
        None => Ok(locate_project_root(None, &options.anchor)?.path),
    }
}

/// Resolve configuration from all sources
///
/// Priority (highest to lowest):
/// 1. `<APP>_<KEY>` environment variables
/// 2. `<KEY>` environment variables
/// 3. `local_config.toml` in the project home
/// 4. `config.toml` in the project home
/// 5. `PROJ_HOME`, set to the resolved project home
///
/// Environment variables only override keys some file (or `PROJ_HOME`)
/// already defines. The project home is registered on `ctx`'s search path.
pub fn load_config(
    ctx: &mut ProjectContext,
    options: &LoadOptions,
) -> Result<ConfigMap, ConfigError> {
    let proj_home = resolve_proj_home(options)?;
    ctx.register_search_path(&proj_home);

    let mut config = ConfigMap::new();
    config.insert(
        PROJ_HOME_KEY,
        Value::String(proj_home.to_string_lossy().into_owned()),
    );
    config.merge(load_module(&proj_home.join(BASE_CONFIG_FILE))?);
    config.merge(load_module(&proj_home.join(LOCAL_CONFIG_FILE))?);

    let app_name = options
        .app_name
        .clone()
        .or_else(|| config.get_str(SERVICE_KEY).map(str::to_string))
        .unwrap_or_default();
    update_from_env(&app_name, &mut config);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_module_keeps_uppercase_only() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
lowercase = 1
Mixed = 2
FOO = { bar = ["baz", 1] }
"#,
        )
        .unwrap();

        let config = load_module(&path).unwrap();
        let expected: ConfigMap = [("FOO", json!({"bar": ["baz", 1]}))].into_iter().collect();
        assert_eq!(config, expected);
    }

    #[test]
    fn test_load_module_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_module(&temp_dir.path().join("nope.toml")).unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_load_module_syntax_error_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "invalid toml [[[").unwrap();

        let result = load_module(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_toml_scalar_conversion() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
RATIO = 0.25
ENABLED = true
STARTED = 1979-05-27T07:32:00Z
HOSTS = [[1, 2], ["a"]]
"#,
        )
        .unwrap();

        let config = load_module(&path).unwrap();
        assert_eq!(config.get("RATIO"), Some(&json!(0.25)));
        assert_eq!(config.get_bool("ENABLED"), Some(true));
        assert_eq!(config.get_str("STARTED"), Some("1979-05-27T07:32:00Z"));
        assert_eq!(config.get("HOSTS"), Some(&json!([[1, 2], ["a"]])));
    }

    #[test]
    #[serial]
    fn test_load_config_local_overrides_base() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(BASE_CONFIG_FILE),
            "PW_LOADER_A = 1\nPW_LOADER_B = \"base\"\n",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join(LOCAL_CONFIG_FILE),
            "PW_LOADER_B = \"local\"\n",
        )
        .unwrap();

        let mut ctx = ProjectContext::new();
        let options = LoadOptions {
            proj_home: Some(temp_dir.path().to_path_buf()),
            app_name: Some("pw-loader-test".to_string()),
            ..Default::default()
        };
        let config = load_config(&mut ctx, &options).unwrap();

        assert_eq!(config.get("PW_LOADER_A"), Some(&json!(1)));
        assert_eq!(config.get_str("PW_LOADER_B"), Some("local"));
        assert_eq!(config.proj_home().as_deref(), Some(temp_dir.path()));
        assert_eq!(ctx.search_path(), &[temp_dir.path().to_path_buf()]);
    }

    #[test]
    fn test_load_config_missing_explicit_home() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");

        let mut ctx = ProjectContext::new();
        let options = LoadOptions {
            proj_home: Some(missing.clone()),
            ..Default::default()
        };
        let err = load_config(&mut ctx, &options).unwrap_err();
        assert!(matches!(err, ConfigError::MissingProjectHome { ref path } if *path == missing));
        assert!(ctx.search_path().is_empty());
    }

    #[test]
    #[serial]
    fn test_service_key_is_default_app_name() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(BASE_CONFIG_FILE),
            "SERVICE = \"pw.svc\"\nPW_SVC_PORT = 80\n",
        )
        .unwrap();

        unsafe { std::env::set_var("PW_SVC_PW_SVC_PORT", "8080") };
        let mut ctx = ProjectContext::new();
        let options = LoadOptions {
            proj_home: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let config = load_config(&mut ctx, &options);
        unsafe { std::env::remove_var("PW_SVC_PW_SVC_PORT") };

        assert_eq!(config.unwrap().get("PW_SVC_PORT"), Some(&json!(8080)));
    }
}
