//! Script loading and execution errors

use crate::logging::{codes, Code};
use std::path::{Path, PathBuf};

pub type ScriptResult<T> = Result<T, ScriptError>;

/// Raised by the `regex` prelude function when a pattern does not compile
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid regular expression '{pattern}': {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: String,
}

/// Check-definition script errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    #[error("Required file \"{}\" does not exist.", path.display())]
    MissingFile { path: PathBuf },

    #[error("Script {} is {size} bytes, limit is {max} bytes", path.display())]
    TooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Cannot read script {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("Syntax error in {}: {message}", location(path, line))]
    Syntax {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("Script error: {message}")]
    Runtime { message: String },

    #[error("{0}")]
    InvalidPattern(PatternError),

    #[error("Unsupported script value: {type_name}")]
    UnsupportedValue { type_name: String },

    #[error("Script value nested deeper than {max_depth} levels")]
    NestingTooDeep { max_depth: usize },

    #[error("Script does not define a global named '{name}'")]
    UnknownGlobal { name: String },
}

impl ScriptError {
    pub fn missing_file(path: &Path) -> Self {
        Self::MissingFile {
            path: path.to_path_buf(),
        }
    }

    pub fn io(path: &Path, error: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    pub fn unknown_global(name: &str) -> Self {
        Self::UnknownGlobal {
            name: name.to_string(),
        }
    }

    /// Map an interpreter error raised while running script code
    ///
    /// Callback wrappers are unwound so that a `regex` failure deep inside a
    /// check function still surfaces as `InvalidPattern`.
    pub fn from_lua(error: mlua::Error) -> Self {
        match error {
            mlua::Error::CallbackError { cause, .. }
            | mlua::Error::WithContext { cause, .. } => Self::from_lua((*cause).clone()),
            mlua::Error::ExternalError(inner) => match inner.downcast_ref::<PatternError>() {
                Some(pattern) => Self::InvalidPattern(pattern.clone()),
                None => Self::runtime(inner.to_string()),
            },
            mlua::Error::RuntimeError(message) => Self::runtime(message),
            other => Self::runtime(other.to_string()),
        }
    }

    /// Map an interpreter error raised while compiling `path`
    pub fn from_compile(path: &Path, error: mlua::Error) -> Self {
        match error {
            mlua::Error::SyntaxError { message, .. } => {
                let (line, detail) = split_syntax_error(&message);
                Self::Syntax {
                    path: path.to_path_buf(),
                    line,
                    message: detail.to_string(),
                }
            }
            other => Self::from_lua(other),
        }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::MissingFile { .. } => codes::script::MISSING_FILE,
            Self::TooLarge { .. } => codes::script::SCRIPT_TOO_LARGE,
            Self::Io { .. } => codes::script::READ_FAILURE,
            Self::Syntax { .. } => codes::script::SYNTAX_ERROR,
            Self::Runtime { .. } => codes::script::RUNTIME_ERROR,
            Self::InvalidPattern(_) => codes::script::INVALID_PATTERN,
            Self::UnsupportedValue { .. } | Self::NestingTooDeep { .. } => {
                codes::script::UNSUPPORTED_VALUE
            }
            Self::UnknownGlobal { .. } => codes::script::UNKNOWN_GLOBAL,
        }
    }
}

fn location(path: &Path, line: &Option<usize>) -> String {
    match line {
        Some(line) => format!("{}:{}", path.display(), line),
        None => path.display().to_string(),
    }
}

/// Split `chunk:12: unexpected symbol` into line and detail
///
/// The interpreter shortens long chunk names, so only the part after the
/// line number is kept.
fn split_syntax_error(message: &str) -> (Option<usize>, &str) {
    let mut offset = 0;
    for segment in message.split(':') {
        let end = offset + segment.len();
        if offset > 0 && !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(line) = segment.parse() {
                let detail = message.get(end + 1..).unwrap_or_default().trim_start();
                return (Some(line), detail);
            }
        }
        offset = end + 1;
    }
    (None, message)
}
