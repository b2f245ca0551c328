//! Type-safe logging macros using Code types with Display support

/// Log error with Code type - accepts Display types for context values
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr) => {
        $crate::logging::log_with_context(
            $crate::logging::LogEvent::error($code, $message),
            vec![],
        )
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::logging::log_with_context(
            $crate::logging::LogEvent::error($code, $message),
            vec![$(($key, format!("{}", $value))),+],
        )
    };
}

/// Log success with Code type - accepts Display types for context values
#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr) => {
        $crate::logging::log_with_context(
            $crate::logging::LogEvent::success($code, $message),
            vec![],
        )
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::logging::log_with_context(
            $crate::logging::LogEvent::success($code, $message),
            vec![$(($key, format!("{}", $value))),+],
        )
    };
}

/// Log informational message - accepts Display types for context values
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        $crate::logging::log_with_context($crate::logging::LogEvent::info($message), vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::logging::log_with_context(
            $crate::logging::LogEvent::info($message),
            vec![$(($key, format!("{}", $value))),+],
        )
    };
}

/// Log warning message - accepts Display types for context values
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        $crate::logging::log_with_context($crate::logging::LogEvent::warning($message), vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::logging::log_with_context(
            $crate::logging::LogEvent::warning($message),
            vec![$(($key, format!("{}", $value))),+],
        )
    };
}

/// Log debug message - context is only rendered when debug output is enabled
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        if $crate::logging::enabled($crate::logging::LogLevel::Debug) {
            $crate::logging::log_with_context($crate::logging::LogEvent::debug($message), vec![])
        }
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        if $crate::logging::enabled($crate::logging::LogLevel::Debug) {
            $crate::logging::log_with_context(
                $crate::logging::LogEvent::debug($message),
                vec![$(($key, format!("{}", $value))),+],
            )
        }
    };
}
