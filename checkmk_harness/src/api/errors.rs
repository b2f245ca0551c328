//! # Harness Errors

use crate::agent::AgentError;
use crate::check::CheckError;
use crate::config::ConfigError;
use crate::logging::{codes, Code};
use crate::script::ScriptError;
use crate::section::SectionError;
use crate::validation::ValidationError;
use std::fmt;
use std::path::Path;

/// Broad failure classes callers discriminate on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Check file or agent executable absent
    MissingResource,
    /// Test data, result, inventory or perfdata of the wrong shape
    MalformedData,
    /// Check file does not compile; position information is kept
    ScriptCompilation,
    /// Check code raised an error
    ScriptExecution,
    /// Harness misuse, e.g. no check named
    Usage,
    Configuration,
    AgentExecution,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingResource => "missing_resource",
            ErrorKind::MalformedData => "malformed_data",
            ErrorKind::ScriptCompilation => "script_compilation",
            ErrorKind::ScriptExecution => "script_execution",
            ErrorKind::Usage => "usage",
            ErrorKind::Configuration => "configuration",
            ErrorKind::AgentExecution => "agent_execution",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every error the harness surfaces
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HarnessError {
    #[error("Please specify the check to test with \"test_for = 'my_check'\"")]
    MissingTestFor,

    #[error(transparent)]
    Section(#[from] SectionError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl HarnessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HarnessError::MissingTestFor => ErrorKind::Usage,
            HarnessError::Section(_) => ErrorKind::MalformedData,
            HarnessError::Script(e) => script_kind(e),
            HarnessError::Check(e) => check_kind(e),
            HarnessError::Validation(ValidationError::Check(e)) => check_kind(e),
            HarnessError::Validation(_) => ErrorKind::MalformedData,
            HarnessError::Agent(AgentError::MissingExecutable { .. }) => ErrorKind::MissingResource,
            HarnessError::Agent(_) => ErrorKind::AgentExecution,
            HarnessError::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            HarnessError::MissingTestFor => codes::check::USAGE,
            HarnessError::Section(e) => e.error_code(),
            HarnessError::Script(e) => e.error_code(),
            HarnessError::Check(e) => e.error_code(),
            HarnessError::Validation(e) => e.error_code(),
            HarnessError::Agent(e) => e.error_code(),
            HarnessError::Config(e) => e.error_code(),
        }
    }

    /// Path of the missing check file or agent executable
    pub fn missing_path(&self) -> Option<&Path> {
        let script = match self {
            HarnessError::Agent(AgentError::MissingExecutable { path }) => return Some(path),
            HarnessError::Script(e) => e,
            HarnessError::Check(CheckError::Script(e)) => e,
            _ => return None,
        };
        match script {
            ScriptError::MissingFile { path } => Some(path),
            _ => None,
        }
    }
}

fn script_kind(error: &ScriptError) -> ErrorKind {
    match error {
        ScriptError::MissingFile { .. } | ScriptError::Io { .. } => ErrorKind::MissingResource,
        ScriptError::Syntax { .. } => ErrorKind::ScriptCompilation,
        ScriptError::Runtime { .. }
        | ScriptError::InvalidPattern(_)
        | ScriptError::UnknownGlobal { .. } => ErrorKind::ScriptExecution,
        ScriptError::TooLarge { .. }
        | ScriptError::UnsupportedValue { .. }
        | ScriptError::NestingTooDeep { .. } => ErrorKind::MalformedData,
    }
}

fn check_kind(error: &CheckError) -> ErrorKind {
    match error {
        CheckError::ForeignCheck { .. } => ErrorKind::Usage,
        CheckError::Script(e) => script_kind(e),
        _ => ErrorKind::MalformedData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_kinds() {
        assert_eq!(HarnessError::MissingTestFor.kind(), ErrorKind::Usage);
        assert_eq!(
            HarnessError::from(SectionError::invalid_header("foo")).kind(),
            ErrorKind::MalformedData
        );
        assert_eq!(
            HarnessError::from(CheckError::Script(ScriptError::Syntax {
                path: PathBuf::from("checks/foo"),
                line: Some(1),
                message: "unexpected symbol near 'end'".to_string(),
            }))
            .kind(),
            ErrorKind::ScriptCompilation
        );
        assert_eq!(
            HarnessError::from(ValidationError::Check(CheckError::ForeignCheck {
                name: "bar".to_string(),
                file: "foo".to_string(),
            }))
            .kind(),
            ErrorKind::Usage
        );
        assert_eq!(
            HarnessError::from(AgentError::Timeout {
                path: PathBuf::from("agents/x"),
                timeout_ms: 1,
            })
            .kind(),
            ErrorKind::AgentExecution
        );
    }

    #[test]
    fn test_missing_path() {
        let path = PathBuf::from("checks/foo");
        let error = HarnessError::from(CheckError::Script(ScriptError::missing_file(&path)));
        assert_eq!(error.kind(), ErrorKind::MissingResource);
        assert_eq!(error.missing_path(), Some(path.as_path()));
        assert_eq!(error.to_string(), "Required file \"checks/foo\" does not exist.");

        assert_eq!(HarnessError::MissingTestFor.missing_path(), None);
    }

    #[test]
    fn test_usage_message() {
        assert_eq!(
            HarnessError::MissingTestFor.to_string(),
            "Please specify the check to test with \"test_for = 'my_check'\""
        );
    }
}
