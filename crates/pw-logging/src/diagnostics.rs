//! Process-level tracing output for the library's own diagnostics.
//!
//! Config resolution and log setup report through `tracing`; nothing is
//! printed until a subscriber is installed, which [`init`] does.
//! `ProjectWorker::new` calls it. Callers using `load_config` or
//! `setup_logging` directly call it themselves or install their own
//! subscriber.

use std::sync::OnceLock;

/// Environment variable selecting the diagnostic level
pub const PW_LOG_ENV: &str = "PW_LOG";

static INIT: OnceLock<()> = OnceLock::new();

fn parse_level(value: Option<&str>) -> tracing::Level {
    match value.unwrap_or("info").to_ascii_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

/// Install a `tracing_subscriber::fmt` subscriber at the level named by
/// `PW_LOG`, writing to stderr.
///
/// Safe to call more than once; only the first call has any effect, and a
/// subscriber installed elsewhere is left alone.
pub fn init() {
    INIT.get_or_init(|| {
        let level = parse_level(std::env::var(PW_LOG_ENV).ok().as_deref());
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Whether [`init`] has run in this process
pub fn is_initialized() -> bool {
    INIT.get().is_some()
}
