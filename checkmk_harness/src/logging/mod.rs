//! Logging module for the check harness
//!
//! Coded events are rendered once and handed to the `log` facade under the
//! `checkmk_harness` target. Binaries decide where they end up (the CLI
//! installs `env_logger`); library users that install nothing get silence.

pub mod codes;
pub mod events;
pub mod macros;

pub use codes::Code;
pub use crate::config::LogLevel;
pub use events::LogEvent;

/// Target used for every event emitted by the harness
pub const LOG_TARGET: &str = "checkmk_harness";

/// Whether events of `level` would currently be recorded
pub fn enabled(level: LogLevel) -> bool {
    log::log_enabled!(target: LOG_TARGET, level.to_log_level())
}

/// Emit a fully built event
pub fn emit(event: &LogEvent) {
    log::log!(target: LOG_TARGET, event.level.to_log_level(), "{}", event.format());
}

/// Attach context and emit (used by the `log_*!` macros)
pub fn log_with_context(mut event: LogEvent, context: Vec<(&str, String)>) {
    for (key, value) in context {
        event = event.with_context(key, &value);
    }
    emit(&event);
}
