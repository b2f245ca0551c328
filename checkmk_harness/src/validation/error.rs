//! Structural validation errors

use crate::check::CheckError;
use crate::logging::{codes, Code};

/// A check result, perfdata entry or inventory that does not have the
/// expected shape
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Malformed result of check '{check}': {message} (got {fragment})")]
    InvalidResult {
        check: String,
        message: String,
        fragment: String,
    },

    #[error("Malformed perfdata entry: {message} (got {fragment})")]
    InvalidPerfdata { message: String, fragment: String },

    #[error("Malformed inventory of check '{check}': {message} (got {fragment})")]
    InvalidInventory {
        check: String,
        message: String,
        fragment: String,
    },

    #[error("Check '{check}' has no service description to validate its inventory against")]
    MissingServiceDescription { check: String },

    #[error(transparent)]
    Check(#[from] CheckError),
}

impl ValidationError {
    pub fn invalid_result(check: &str, message: impl Into<String>, fragment: impl ToString) -> Self {
        Self::InvalidResult {
            check: check.to_string(),
            message: message.into(),
            fragment: fragment.to_string(),
        }
    }

    pub fn invalid_perfdata(message: impl Into<String>, fragment: impl ToString) -> Self {
        Self::InvalidPerfdata {
            message: message.into(),
            fragment: fragment.to_string(),
        }
    }

    pub fn invalid_inventory(
        check: &str,
        message: impl Into<String>,
        fragment: impl ToString,
    ) -> Self {
        Self::InvalidInventory {
            check: check.to_string(),
            message: message.into(),
            fragment: fragment.to_string(),
        }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::InvalidResult { .. } => codes::validation::INVALID_RESULT,
            Self::InvalidPerfdata { .. } => codes::validation::INVALID_PERFDATA,
            Self::InvalidInventory { .. } | Self::MissingServiceDescription { .. } => {
                codes::validation::INVALID_INVENTORY
            }
            Self::Check(e) => e.error_code(),
        }
    }

    /// The offending value as rendered for the message, if any
    pub fn fragment(&self) -> Option<&str> {
        match self {
            Self::InvalidResult { fragment, .. }
            | Self::InvalidPerfdata { fragment, .. }
            | Self::InvalidInventory { fragment, .. } => Some(fragment),
            _ => None,
        }
    }
}
