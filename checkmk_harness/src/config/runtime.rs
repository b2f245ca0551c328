// RUNTIME PREFERENCES (User Experience)

use crate::config::constants::compile_time::harness::{
    DEFAULT_AGENTS_DIR, DEFAULT_AGENT_TIMEOUT_SECS, DEFAULT_CHECKS_DIR, MAX_AGENT_TIMEOUT_SECS,
};
use crate::logging::{codes, Code};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loading errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("Invalid configuration file {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("Agent timeout of {secs}s is outside 1..={max}s")]
    TimeoutOutOfRange { secs: u64, max: u64 },
}

impl ConfigError {
    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::Unreadable { .. } => codes::config::UNREADABLE_CONFIG,
            Self::Invalid { .. } | Self::TimeoutOutOfRange { .. } => codes::config::INVALID_CONFIG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Level on the `log` facade
    pub fn to_log_level(&self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        }
    }

    /// Convert to the `log` facade filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }

    /// Raise the level by `steps` (used for repeated `-v` flags)
    pub fn raised_by(self, steps: u8) -> Self {
        match (self as u8).saturating_add(steps) {
            0 => LogLevel::Error,
            1 => LogLevel::Warning,
            2 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    pub const CHECKS_DIR: &str = "CHECKMK_HARNESS_CHECKS_DIR";
    pub const AGENTS_DIR: &str = "CHECKMK_HARNESS_AGENTS_DIR";
    pub const AGENT_TIMEOUT: &str = "CHECKMK_HARNESS_AGENT_TIMEOUT";
    pub const LOG_LEVEL: &str = "CHECKMK_HARNESS_LOG_LEVEL";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessPreferences {
    /// Directory that check-definition files are loaded from
    pub checks_dir: PathBuf,

    /// Directory that agent executables are resolved against
    pub agents_dir: PathBuf,

    /// Seconds an agent executable may run before it is killed
    pub agent_timeout_secs: u64,

    /// Minimum level of emitted log events
    pub log_level: LogLevel,
}

impl Default for HarnessPreferences {
    fn default() -> Self {
        Self {
            checks_dir: env::var(env_vars::CHECKS_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CHECKS_DIR)),
            agents_dir: env::var(env_vars::AGENTS_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_AGENTS_DIR)),
            agent_timeout_secs: env::var(env_vars::AGENT_TIMEOUT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_AGENT_TIMEOUT_SECS),
            log_level: env::var(env_vars::LOG_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Warning),
        }
    }
}

impl HarnessPreferences {
    /// Parse preferences from TOML text; absent keys keep their defaults
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let preferences: Self = toml::from_str(text).map_err(|e| ConfigError::Invalid {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        preferences.validate()?;
        Ok(preferences)
    }

    /// Load preferences from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Check preferences against the compile-time bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent_timeout_secs == 0 || self.agent_timeout_secs > MAX_AGENT_TIMEOUT_SECS {
            return Err(ConfigError::TimeoutOutOfRange {
                secs: self.agent_timeout_secs,
                max: MAX_AGENT_TIMEOUT_SECS,
            });
        }
        Ok(())
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs)
    }

    pub fn with_checks_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checks_dir = dir.into();
        self
    }

    pub fn with_agents_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.agents_dir = dir.into();
        self
    }

    pub fn with_agent_timeout_secs(mut self, secs: u64) -> Self {
        self.agent_timeout_secs = secs;
        self
    }
}
