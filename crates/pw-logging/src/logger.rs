//! Named loggers and the registry that owns them
//!
//! Loggers form a dotted hierarchy (`app.db` is a child of `app`). A logger
//! without its own level inherits the nearest ancestor's; the root logger
//! sits at WARNING. Records are handed to the logger's own handlers, then to
//! each ancestor's while `propagate` stays true along the way.

use crate::handler::Handler;
use crate::level::Level;
use crate::record::{CallSite, ExceptionInfo, LogRecord, Message};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Name of the root logger
pub const ROOT_LOGGER: &str = "root";

/// Level of the root logger in a fresh registry
pub const ROOT_LEVEL: Level = Level::Warning;

pub struct Logger {
    name: String,
    level: RwLock<Option<Level>>,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
    propagate: AtomicBool,
    parent: Option<Arc<Logger>>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("handlers", &self.handlers().len())
            .field("propagate", &self.propagate())
            .finish()
    }
}

impl Logger {
    fn new(name: &str, level: Option<Level>, parent: Option<Arc<Logger>>) -> Self {
        Self {
            name: name.to_string(),
            level: RwLock::new(level),
            handlers: RwLock::new(Vec::new()),
            propagate: AtomicBool::new(true),
            parent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<Logger>> {
        self.parent.as_ref()
    }

    /// Level set directly on this logger
    pub fn level(&self) -> Option<Level> {
        *self.level.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_level(&self, level: Level) {
        *self.level.write().unwrap_or_else(|e| e.into_inner()) = Some(level);
    }

    /// Level in effect: this logger's own, else the nearest ancestor's
    pub fn effective_level(&self) -> Level {
        let mut current = Some(self);
        while let Some(logger) = current {
            if let Some(level) = logger.level() {
                return level;
            }
            current = logger.parent.as_deref();
        }
        ROOT_LEVEL
    }

    pub fn is_enabled_for(&self, level: Level) -> bool {
        level >= self.effective_level()
    }

    pub fn propagate(&self) -> bool {
        self.propagate.load(Ordering::SeqCst)
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.propagate.store(propagate, Ordering::SeqCst);
    }

    /// Snapshot of the attached handlers
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.handlers.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace all attached handlers
    pub fn set_handlers(&self, handlers: Vec<Arc<dyn Handler>>) {
        *self.handlers.write().unwrap_or_else(|e| e.into_inner()) = handlers;
    }

    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(handler);
    }

    /// Detach every handler, returning them
    pub fn clear_handlers(&self) -> Vec<Arc<dyn Handler>> {
        std::mem::take(&mut *self.handlers.write().unwrap_or_else(|e| e.into_inner()))
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<Message>) {
        if self.is_enabled_for(level) {
            let record = self.make_record(level, message.into(), caller());
            self.handle(&record);
        }
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<Message>) {
        self.log(Level::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<Message>) {
        self.log(Level::Info, message);
    }

    #[track_caller]
    pub fn warning(&self, message: impl Into<Message>) {
        self.log(Level::Warning, message);
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<Message>) {
        self.log(Level::Error, message);
    }

    #[track_caller]
    pub fn critical(&self, message: impl Into<Message>) {
        self.log(Level::Critical, message);
    }

    /// Log `message` with a structured description of `error` attached
    #[track_caller]
    pub fn log_exception<E>(&self, level: Level, message: impl Into<Message>, error: &E)
    where
        E: std::error::Error + ?Sized,
    {
        if self.is_enabled_for(level) {
            let record = self
                .make_record(level, message.into(), caller())
                .with_exception(ExceptionInfo::from_error(error));
            self.handle(&record);
        }
    }

    /// Shorthand for [`Logger::log_exception`] at ERROR
    #[track_caller]
    pub fn exception<E>(&self, message: impl Into<Message>, error: &E)
    where
        E: std::error::Error + ?Sized,
    {
        self.log_exception(Level::Error, message, error);
    }

    /// Log with extra fields rendered after the standard ones
    #[track_caller]
    pub fn log_with(&self, level: Level, message: impl Into<Message>, extra: Map<String, Value>) {
        if self.is_enabled_for(level) {
            let record = self
                .make_record(level, message.into(), caller())
                .with_extra(extra);
            self.handle(&record);
        }
    }

    /// Log from an explicit call site; used by the logging macros
    pub fn log_at(&self, level: Level, message: Message, site: CallSite) {
        if self.is_enabled_for(level) {
            let record = self.make_record(level, message, site);
            self.handle(&record);
        }
    }

    fn make_record(&self, level: Level, message: Message, site: CallSite) -> LogRecord {
        LogRecord::new(&self.name, level, message, site)
    }

    /// Dispatch a record to this logger's handlers and, while propagation
    /// allows, to its ancestors'. The level of the originating logger has
    /// already been checked; handler levels are checked here.
    pub fn handle(&self, record: &LogRecord) {
        let mut current = Some(self);
        while let Some(logger) = current {
            for handler in logger.handlers() {
                if handler.level().is_some_and(|min| record.level < min) {
                    continue;
                }
                if let Err(e) = handler.emit(record) {
                    eprintln!(
                        "Warning: failed to emit log record via {}: {e}",
                        handler.describe()
                    );
                }
            }
            if !logger.propagate() {
                break;
            }
            current = logger.parent.as_deref();
        }
    }
}

#[track_caller]
fn caller() -> CallSite {
    CallSite::from_location(Location::caller())
}

/// Owns every logger created by name.
///
/// Ancestors are created eagerly, so `get_logger("a.b.c")` also creates
/// `a` and `a.b`. Asking for the same name twice returns the same logger.
#[derive(Debug)]
pub struct LoggerRegistry {
    root: Arc<Logger>,
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self {
            root: Arc::new(Logger::new(ROOT_LOGGER, Some(ROOT_LEVEL), None)),
            loggers: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> Arc<Logger> {
        Arc::clone(&self.root)
    }

    /// Get or create the logger named `name`; empty or `"root"` is the root
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        if name.is_empty() || name == ROOT_LOGGER {
            return self.root();
        }

        let mut loggers = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
        let mut parent = Arc::clone(&self.root);
        let mut end = 0;
        for segment in name.split('.') {
            end += segment.len();
            let prefix = &name[..end];
            end += 1;
            if segment.is_empty() {
                continue;
            }
            let logger = loggers
                .entry(prefix.to_string())
                .or_insert_with(|| Arc::new(Logger::new(prefix, None, Some(Arc::clone(&parent)))));
            parent = Arc::clone(logger);
        }
        parent
    }

    /// Names of every logger created so far, excluding the root
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .loggers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LogError;

    /// Handler that keeps every record it receives
    #[derive(Default)]
    struct Capture {
        records: Mutex<Vec<LogRecord>>,
        level: Option<Level>,
    }

    impl Capture {
        fn messages(&self) -> Vec<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.message.render().unwrap())
                .collect()
        }
    }

    impl Handler for Capture {
        fn emit(&self, record: &LogRecord) -> Result<(), LogError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        fn level(&self) -> Option<Level> {
            self.level
        }

        fn describe(&self) -> String {
            "Capture".to_string()
        }
    }

    struct Failing;

    impl Handler for Failing {
        fn emit(&self, _record: &LogRecord) -> Result<(), LogError> {
            Err(LogError::Io(std::io::Error::other("sink offline")))
        }

        fn describe(&self) -> String {
            "Failing".to_string()
        }
    }

    #[test]
    fn test_registry_returns_same_logger() {
        let registry = LoggerRegistry::new();
        let a = registry.get_logger("app.db");
        let b = registry.get_logger("app.db");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.names(), vec!["app".to_string(), "app.db".to_string()]);
        assert_eq!(a.parent().unwrap().name(), "app");
        assert!(Arc::ptr_eq(&registry.get_logger("root"), &registry.root()));
    }

    #[test]
    fn test_effective_level_inherits() {
        let registry = LoggerRegistry::new();
        let child = registry.get_logger("app.db");
        assert_eq!(child.effective_level(), Level::Warning);

        registry.get_logger("app").set_level(Level::Debug);
        assert_eq!(child.effective_level(), Level::Debug);

        child.set_level(Level::Error);
        assert!(!child.is_enabled_for(Level::Warning));
        assert!(child.is_enabled_for(Level::Critical));
    }

    #[test]
    fn test_level_filtering() {
        let registry = LoggerRegistry::new();
        let logger = registry.get_logger("svc");
        logger.set_level(Level::Info);
        let capture = Arc::new(Capture::default());
        logger.set_handlers(vec![capture.clone() as Arc<dyn Handler>]);

        logger.debug("hidden");
        logger.info("shown");
        logger.critical("also shown");

        assert_eq!(capture.messages(), vec!["shown", "also shown"]);
    }

    #[test]
    fn test_handler_level_filtering() {
        let registry = LoggerRegistry::new();
        let logger = registry.get_logger("svc");
        logger.set_level(Level::Debug);
        let errors_only = Arc::new(Capture {
            level: Some(Level::Error),
            ..Default::default()
        });
        logger.set_handlers(vec![errors_only.clone() as Arc<dyn Handler>]);

        logger.info("skipped");
        logger.error("kept");

        assert_eq!(errors_only.messages(), vec!["kept"]);
    }

    #[test]
    fn test_propagation_to_ancestors() {
        let registry = LoggerRegistry::new();
        let parent = registry.get_logger("app");
        let child = registry.get_logger("app.http");
        let parent_capture = Arc::new(Capture::default());
        let child_capture = Arc::new(Capture::default());
        parent.set_handlers(vec![parent_capture.clone() as Arc<dyn Handler>]);
        child.set_handlers(vec![child_capture.clone() as Arc<dyn Handler>]);

        child.warning("retrying");
        assert_eq!(child_capture.messages(), vec!["retrying"]);
        assert_eq!(parent_capture.messages(), vec!["retrying"]);

        child.set_propagate(false);
        child.warning("quiet");
        assert_eq!(child_capture.messages().len(), 2);
        assert_eq!(parent_capture.messages().len(), 1);
    }

    #[test]
    fn test_track_caller_location() {
        let registry = LoggerRegistry::new();
        let logger = registry.get_logger("svc");
        let capture = Arc::new(Capture::default());
        logger.set_handlers(vec![capture.clone() as Arc<dyn Handler>]);

        let line = line!() + 1;
        logger.error("here");

        let records = capture.records.lock().unwrap();
        assert_eq!(records[0].lineno, line);
        assert_eq!(records[0].filename, "logger.rs");
        assert_eq!(records[0].name, "svc");
    }

    #[test]
    fn test_macros_capture_function_and_format() {
        let registry = LoggerRegistry::new();
        let logger = registry.get_logger("svc");
        logger.set_level(Level::Debug);
        let capture = Arc::new(Capture::default());
        logger.set_handlers(vec![capture.clone() as Arc<dyn Handler>]);

        crate::pw_info!(logger, "loaded {} rows", 3);
        crate::pw_debug!(logger, "plain");

        let records = capture.records.lock().unwrap();
        assert_eq!(records[0].message.render().unwrap(), "loaded 3 rows");
        assert_eq!(records[0].func_name, "test_macros_capture_function_and_format");
        assert_eq!(records[0].level, Level::Info);
        assert_eq!(records[1].level, Level::Debug);
    }

    #[test]
    fn test_exception_attached() {
        let registry = LoggerRegistry::new();
        let logger = registry.get_logger("svc");
        let capture = Arc::new(Capture::default());
        logger.set_handlers(vec![capture.clone() as Arc<dyn Handler>]);

        let err = std::io::Error::other("disk full");
        logger.exception("write failed", &err);

        let records = capture.records.lock().unwrap();
        let exception = records[0].exception.as_ref().unwrap();
        assert_eq!(exception.message, "disk full");
        assert_eq!(records[0].level, Level::Error);
    }

    #[test]
    fn test_failing_handler_does_not_stop_others() {
        let registry = LoggerRegistry::new();
        let logger = registry.get_logger("svc");
        let capture = Arc::new(Capture::default());
        logger.set_handlers(vec![Arc::new(Failing) as Arc<dyn Handler>, capture.clone()]);

        logger.error("still delivered");

        assert_eq!(capture.messages(), vec!["still delivered"]);
    }

    #[test]
    fn test_clear_handlers() {
        let registry = LoggerRegistry::new();
        let logger = registry.get_logger("svc");
        logger.add_handler(Arc::new(Capture::default()));
        logger.add_handler(Arc::new(Capture::default()));

        assert_eq!(logger.clear_handlers().len(), 2);
        assert!(logger.handlers().is_empty());
    }
}
