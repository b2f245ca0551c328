//! Check lookup and invocation errors

use crate::logging::{codes, Code};
use crate::script::ScriptError;
use crate::section::SectionError;

/// Errors raised while resolving or driving a registered check
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckError {
    #[error("Check '{name}' is not registered in check_info of '{file}'")]
    UnknownCheck { name: String, file: String },

    #[error("Cannot use check '{name}' with the check file for section '{file}'")]
    ForeignCheck { name: String, file: String },

    #[error("Wrong section name in test data: expected \"{expected}\", got \"{got}\"")]
    WrongSection { expected: String, got: String },

    #[error("Check '{check}' does not define '{field}'")]
    MissingField { check: String, field: &'static str },

    #[error("Registration of '{check}' is malformed: {message}")]
    MalformedRegistration { check: String, message: String },

    #[error("Check '{check}' declared multiple results but produced none")]
    EmptyMultiResult { check: String },

    #[error("Partial result {index} of '{check}' is malformed: {message}")]
    MalformedPartialResult {
        check: String,
        index: usize,
        message: String,
    },

    #[error("{function} of '{check}' returned a {found}, expected {expected}")]
    UnexpectedReturn {
        check: String,
        function: &'static str,
        found: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Section(#[from] SectionError),

    #[error(transparent)]
    Script(#[from] ScriptError),
}

impl CheckError {
    pub fn missing_field(check: &str, field: &'static str) -> Self {
        Self::MissingField {
            check: check.to_string(),
            field,
        }
    }

    pub fn malformed_registration(check: &str, message: impl Into<String>) -> Self {
        Self::MalformedRegistration {
            check: check.to_string(),
            message: message.into(),
        }
    }

    pub fn malformed_partial(check: &str, index: usize, message: impl Into<String>) -> Self {
        Self::MalformedPartialResult {
            check: check.to_string(),
            index,
            message: message.into(),
        }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::UnknownCheck { .. } => codes::check::UNKNOWN_CHECK,
            Self::ForeignCheck { .. } => codes::check::USAGE,
            Self::WrongSection { .. } => codes::check::WRONG_SECTION,
            Self::MissingField { .. } => codes::check::MISSING_FIELD,
            Self::MalformedRegistration { .. } => codes::check::MALFORMED_REGISTRATION,
            Self::EmptyMultiResult { .. } => codes::check::EMPTY_MULTI_RESULT,
            Self::MalformedPartialResult { .. } => codes::check::MALFORMED_PARTIAL_RESULT,
            Self::UnexpectedReturn { .. } => codes::check::UNEXPECTED_RETURN,
            Self::Section(e) => e.error_code(),
            Self::Script(e) => e.error_code(),
        }
    }
}
