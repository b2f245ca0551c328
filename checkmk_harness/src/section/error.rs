//! Section parsing errors

use crate::logging::{codes, Code};

pub type SectionResult<T> = Result<T, SectionError>;

/// Malformed agent output
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SectionError {
    #[error("Invalid header in test data: {line}")]
    InvalidHeader { line: String },

    #[error("Invalid section option {option}")]
    InvalidOption { option: String },

    #[error("Test data contains a second section header: {line}")]
    SecondHeader { line: String },
}

impl SectionError {
    pub fn invalid_header(line: &str) -> Self {
        Self::InvalidHeader {
            line: line.to_string(),
        }
    }

    pub fn invalid_option(option: &str) -> Self {
        Self::InvalidOption {
            option: option.to_string(),
        }
    }

    pub fn second_header(line: &str) -> Self {
        Self::SecondHeader {
            line: line.to_string(),
        }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::InvalidHeader { .. } => codes::section::INVALID_HEADER,
            Self::InvalidOption { .. } => codes::section::INVALID_OPTION,
            Self::SecondHeader { .. } => codes::section::SECOND_HEADER,
        }
    }

    /// The fragment of test data the error is about
    pub fn fragment(&self) -> &str {
        match self {
            Self::InvalidHeader { line } | Self::SecondHeader { line } => line,
            Self::InvalidOption { option } => option,
        }
    }
}
