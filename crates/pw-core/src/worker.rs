//! The application facade

use crate::db::{Engine, Session};
use crate::error::{SessionError, WorkerError};
use crate::http::{HttpClient, PoolSettings};
use project_worker_config::{ConfigMap, LoadOptions, ProjectContext, RootAnchor, load_config};
use project_worker_logging::diagnostics;
use project_worker_logging::setup::level_from_config;
use project_worker_logging::{Logger, LoggerRegistry, LoggingOptions, setup_logging};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Config key naming the database to open
pub const DATABASE_URL_KEY: &str = "DATABASE_URL";

/// Older name for [`DATABASE_URL_KEY`], read when it is absent
pub const LEGACY_DATABASE_URL_KEY: &str = "SQLALCHEMY_URL";

/// Config key enabling a stdout log sink next to the file
pub const LOG_STDOUT_KEY: &str = "LOG_STDOUT";

/// Options for [`ProjectWorker::new`]
#[derive(Debug, Clone, Default)]
pub struct WorkerOptions {
    /// Explicit project home; discovered when `None`
    pub proj_home: Option<PathBuf>,
    /// Values applied over everything loaded from files and the environment
    pub local_config: Option<ConfigMap>,
    pub anchor: RootAnchor,
}

/// Bundles what an application needs at startup: resolved config, a
/// logger writing to `<project home>/logs/<app>.log`, an optional database
/// engine and a pooled HTTP client.
#[derive(Debug)]
pub struct ProjectWorker {
    app_name: String,
    context: ProjectContext,
    config: ConfigMap,
    registry: LoggerRegistry,
    logger: Arc<Logger>,
    engine: Option<Engine>,
    http: HttpClient,
}

impl ProjectWorker {
    /// Resolve config, set up logging and open the configured backends.
    ///
    /// Installs the `PW_LOG` diagnostics subscriber first (unless one is
    /// already set) so env overrides applied while loading are reported.
    pub fn new(app_name: &str, options: WorkerOptions) -> Result<Self, WorkerError> {
        diagnostics::init();
        let mut context = ProjectContext::new();
        let mut config = load_config(
            &mut context,
            &LoadOptions {
                proj_home: options.proj_home.clone(),
                anchor: options.anchor.clone(),
                app_name: Some(app_name.to_string()),
            },
        )?;
        if let Some(local) = options.local_config {
            config.merge(local);
        }

        let proj_home = options.proj_home.or_else(|| config.proj_home());
        let registry = LoggerRegistry::new();
        let logging = LoggingOptions {
            name: app_name.to_string(),
            level: Some(level_from_config(&config)?),
            proj_home,
            attach_stdout: log_stdout(&config)?,
            color_stdout: false,
            anchor: options.anchor,
        };
        let logger = setup_logging(&mut context, &registry, &logging)?;

        let engine = match database_url(&config) {
            None => None,
            Some((_, Value::String(url))) => Some(Engine::from_url(url)?),
            Some((key, other)) => {
                return Err(WorkerError::InvalidSetting {
                    key,
                    expected: "a string",
                    value: other.to_string(),
                });
            }
        };

        let http = HttpClient::new(PoolSettings::from_config(&config))?;

        debug!(
            "Worker {app_name} ready (database: {})",
            if engine.is_some() { "configured" } else { "none" }
        );
        Ok(Self {
            app_name: app_name.to_string(),
            context,
            config,
            registry,
            logger,
            engine,
            http,
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn config(&self) -> &ConfigMap {
        &self.config
    }

    pub fn context(&self) -> &ProjectContext {
        &self.context
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// Registry holding this worker's loggers; child loggers created here
    /// (`<app>.db`, ...) report through the worker's handlers
    pub fn registry(&self) -> &LoggerRegistry {
        &self.registry
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Run `f` in a database transaction; see [`Engine::session`].
    ///
    /// Fails with [`SessionError::NotConfigured`] when no `DATABASE_URL` was
    /// set.
    pub fn db_session<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Session<'_>) -> Result<T, E>,
        E: From<SessionError>,
    {
        match &self.engine {
            Some(engine) => engine.session(f),
            None => Err(SessionError::NotConfigured {
                setting: DATABASE_URL_KEY,
            }
            .into()),
        }
    }

    /// Release the database engine and HTTP client and detach the logger's
    /// handlers
    pub fn close(self) {
        self.logger.clear_handlers();
        if let Some(engine) = &self.engine {
            engine.dispose();
        }
    }
}

fn database_url(config: &ConfigMap) -> Option<(&'static str, &Value)> {
    [DATABASE_URL_KEY, LEGACY_DATABASE_URL_KEY]
        .into_iter()
        .find_map(|key| match config.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some((key, value)),
        })
}

fn log_stdout(config: &ConfigMap) -> Result<bool, WorkerError> {
    match config.get(LOG_STDOUT_KEY) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(enabled)) => Ok(*enabled),
        Some(Value::Number(n)) => Ok(n.as_i64() != Some(0)),
        Some(other) => Err(WorkerError::InvalidSetting {
            key: LOG_STDOUT_KEY,
            expected: "a boolean",
            value: other.to_string(),
        }),
    }
}
