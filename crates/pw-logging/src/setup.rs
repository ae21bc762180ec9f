//! Application log setup
//!
//! Every named logger gets a JSON file under `<project home>/logs/`,
//! rotated by size and shared safely between processes.

use crate::error::LogError;
use crate::format::JsonFormatter;
use crate::handler::{Handler, RotatingFileHandler, StreamHandler};
use crate::level::Level;
use crate::logger::{Logger, LoggerRegistry};
use project_worker_config::config::resolve_proj_home;
use project_worker_config::{ConfigMap, LoadOptions, ProjectContext, RootAnchor, load_config};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Directory under the project home that holds log files
pub const LOG_DIR: &str = "logs";

/// Config key consulted when no level is given
pub const LOGGING_LEVEL_KEY: &str = "LOGGING_LEVEL";

pub const DEFAULT_LEVEL: Level = Level::Info;

/// Options for [`setup_logging`]
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Logger name; also names the log file
    pub name: String,
    /// Level to set; read from `LOGGING_LEVEL` config when `None`
    pub level: Option<Level>,
    /// Project home holding the `logs` directory; discovered when `None`
    pub proj_home: Option<PathBuf>,
    /// Also write records to stdout
    pub attach_stdout: bool,
    /// Colorize stdout records by level
    pub color_stdout: bool,
    pub anchor: RootAnchor,
}

impl LoggingOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: None,
            proj_home: None,
            attach_stdout: false,
            color_stdout: false,
            anchor: RootAnchor::default(),
        }
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn proj_home(mut self, proj_home: impl Into<PathBuf>) -> Self {
        self.proj_home = Some(proj_home.into());
        self
    }

    pub fn attach_stdout(mut self, attach: bool) -> Self {
        self.attach_stdout = attach;
        self
    }
}

/// File name for logger `name`: everything before the first `.log`, plus
/// `.log`
pub fn log_file_name(name: &str) -> String {
    let stem = name.split(".log").next().unwrap_or(name);
    format!("{stem}.log")
}

/// Read `LOGGING_LEVEL` from resolved config; missing means INFO.
///
/// Accepts level names (`"debug"`, `"WARNING"`) and numeric values.
pub fn level_from_config(config: &ConfigMap) -> Result<Level, LogError> {
    match config.get(LOGGING_LEVEL_KEY) {
        None | Some(Value::Null) => Ok(DEFAULT_LEVEL),
        Some(Value::String(level)) => level.parse(),
        Some(other) => other.to_string().parse(),
    }
}

/// Configure the logger `options.name` in `registry` and return it.
///
/// With an explicit level and project home, the home is not checked and
/// is created if missing. Without a level, config is loaded first and a
/// missing explicit home is a [`LogError::Config`] error.
///
/// The logger's handlers are replaced by a single rotating JSON file
/// handler, plus an independent stdout handler when requested, and
/// propagation is turned off. Calling this again for the same name leaves
/// exactly the same set of handlers in place.
pub fn setup_logging(
    ctx: &mut ProjectContext,
    registry: &LoggerRegistry,
    options: &LoggingOptions,
) -> Result<Arc<Logger>, LogError> {
    let load_options = LoadOptions {
        proj_home: options.proj_home.clone(),
        anchor: options.anchor.clone(),
        app_name: Some(options.name.clone()),
    };

    let (level, proj_home) = match options.level {
        // an explicit home is created along with its logs directory
        Some(level) => match &options.proj_home {
            Some(path) => (level, path.clone()),
            None => (level, resolve_proj_home(&load_options)?),
        },
        None => {
            let config = load_config(ctx, &load_options)?;
            let proj_home = match config.proj_home() {
                Some(path) => path,
                None => resolve_proj_home(&load_options)?,
            };
            (level_from_config(&config)?, proj_home)
        }
    };

    let log_dir = proj_home.join(LOG_DIR);
    fs::create_dir_all(&log_dir).map_err(|e| LogError::File {
        path: log_dir.clone(),
        source: e,
    })?;
    let log_path = log_dir.join(log_file_name(&options.name));

    let mut handlers: Vec<Arc<dyn Handler>> = vec![Arc::new(RotatingFileHandler::open(
        &log_path,
        JsonFormatter::new(false),
    )?)];
    if options.attach_stdout {
        handlers.push(Arc::new(StreamHandler::stdout(options.color_stdout)));
    }

    let logger = registry.get_logger(&options.name);
    logger.set_handlers(handlers);
    logger.set_level(level);
    logger.set_propagate(false);

    debug!(
        "Logger {} writing to {} at {}",
        options.name,
        log_path.display(),
        level
    );
    Ok(logger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use project_worker_config::config::BASE_CONFIG_FILE;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_name() {
        assert_eq!(log_file_name("worker"), "worker.log");
        assert_eq!(log_file_name("worker.log"), "worker.log");
        assert_eq!(log_file_name("worker.log.old"), "worker.log");
        assert_eq!(log_file_name("app.db"), "app.db.log");
    }

    #[test]
    fn test_level_from_config() {
        let mut config = ConfigMap::new();
        assert_eq!(level_from_config(&config).unwrap(), Level::Info);

        config.insert(LOGGING_LEVEL_KEY, "debug");
        assert_eq!(level_from_config(&config).unwrap(), Level::Debug);

        config.insert(LOGGING_LEVEL_KEY, 40);
        assert_eq!(level_from_config(&config).unwrap(), Level::Error);

        config.insert(LOGGING_LEVEL_KEY, "LOUD");
        assert!(matches!(
            level_from_config(&config),
            Err(LogError::InvalidLevel { .. })
        ));
    }

    #[test]
    fn test_setup_creates_log_dir_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = ProjectContext::new();
        let registry = LoggerRegistry::new();
        let options = LoggingOptions::new("setup_a")
            .level(Level::Debug)
            .proj_home(temp_dir.path());

        let logger = setup_logging(&mut ctx, &registry, &options).unwrap();

        let log_path = temp_dir.path().join(LOG_DIR).join("setup_a.log");
        assert!(log_path.exists());
        assert_eq!(logger.level(), Some(Level::Debug));
        assert!(!logger.propagate());
        assert_eq!(logger.handlers()[0].path(), Some(log_path.as_path()));
    }

    #[test]
    fn test_setup_reads_level_from_config() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(BASE_CONFIG_FILE),
            "LOGGING_LEVEL = \"ERROR\"\n",
        )
        .unwrap();
        let mut ctx = ProjectContext::new();
        let registry = LoggerRegistry::new();
        let options = LoggingOptions::new("setup_b").proj_home(temp_dir.path());

        let logger = setup_logging(&mut ctx, &registry, &options).unwrap();

        assert_eq!(logger.level(), Some(Level::Error));
        assert_eq!(ctx.search_path().len(), 1);
    }

    #[test]
    fn test_setup_with_stdout_handler() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = ProjectContext::new();
        let registry = LoggerRegistry::new();
        let options = LoggingOptions::new("setup_c")
            .level(Level::Info)
            .proj_home(temp_dir.path())
            .attach_stdout(true);

        let logger = setup_logging(&mut ctx, &registry, &options).unwrap();
        assert_eq!(logger.handlers().len(), 2);

        let again = setup_logging(&mut ctx, &registry, &options).unwrap();
        assert!(Arc::ptr_eq(&logger, &again));
        assert_eq!(again.handlers().len(), 2);
    }

    #[test]
    fn test_missing_proj_home() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        let mut ctx = ProjectContext::new();
        let registry = LoggerRegistry::new();

        let from_config = LoggingOptions::new("setup_d").proj_home(&missing);
        let err = setup_logging(&mut ctx, &registry, &from_config).unwrap_err();
        assert!(matches!(err, LogError::Config(_)));
        assert!(!missing.exists());

        let explicit = from_config.level(Level::Info);
        setup_logging(&mut ctx, &registry, &explicit).unwrap();
        assert!(missing.join(LOG_DIR).join("setup_d.log").exists());
    }
}
