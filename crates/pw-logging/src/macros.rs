//! Logging macros
//!
//! Unlike the `Logger` methods, the macros also capture the enclosing
//! function's name and accept format arguments. Arguments are only
//! formatted when the logger is enabled for the level.

/// Name of the enclosing function
#[doc(hidden)]
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __pw_f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::record::trim_function_name(type_name_of(__pw_f))
    }};
}

/// Call site of the macro invocation
#[doc(hidden)]
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::record::CallSite::new(file!(), line!(), $crate::function_name!())
    };
}

/// Log at an explicit level: `pw_log!(logger, Level::Info, "{} rows", n)`
#[macro_export]
macro_rules! pw_log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled_for(level) {
            logger.log_at(
                level,
                $crate::record::Message::from_args(format_args!($($arg)+)),
                $crate::call_site!(),
            );
        }
    }};
}

#[macro_export]
macro_rules! pw_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::pw_log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! pw_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::pw_log!($logger, $crate::Level::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! pw_warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::pw_log!($logger, $crate::Level::Warning, $($arg)+)
    };
}

#[macro_export]
macro_rules! pw_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::pw_log!($logger, $crate::Level::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! pw_critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::pw_log!($logger, $crate::Level::Critical, $($arg)+)
    };
}
