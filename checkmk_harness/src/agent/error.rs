//! Agent execution errors

use crate::logging::{codes, Code};
use std::path::PathBuf;

/// Agent executable errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    #[error("Required file \"{}\" does not exist.", path.display())]
    MissingExecutable { path: PathBuf },

    #[error("Failed to start agent {}: {reason}", path.display())]
    Spawn { path: PathBuf, reason: String },

    #[error("Agent {} exited with {}: {stderr}", path.display(), describe_exit(*code))]
    NonZeroExit {
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Agent {} timed out after {timeout_ms}ms", path.display())]
    Timeout { path: PathBuf, timeout_ms: u64 },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}

impl AgentError {
    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::MissingExecutable { .. } => codes::agent::MISSING_EXECUTABLE,
            Self::Spawn { .. } => codes::agent::SPAWN_FAILURE,
            Self::NonZeroExit { .. } => codes::agent::NON_ZERO_EXIT,
            Self::Timeout { .. } => codes::agent::TIMEOUT,
        }
    }
}
