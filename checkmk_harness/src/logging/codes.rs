//! Consolidated error codes and classification system
//!
//! Single source of truth for all harness codes and their metadata.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct CodeMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub description: &'static str,
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
}

/// Configuration error codes
pub mod config {
    use super::Code;

    pub const UNREADABLE_CONFIG: Code = Code::new("E001");
    pub const INVALID_CONFIG: Code = Code::new("E002");
}

/// Agent output section parsing error codes
pub mod section {
    use super::Code;

    pub const INVALID_HEADER: Code = Code::new("E010");
    pub const INVALID_OPTION: Code = Code::new("E011");
    pub const SECOND_HEADER: Code = Code::new("E012");
}

/// Check-definition script error codes
pub mod script {
    use super::Code;

    pub const MISSING_FILE: Code = Code::new("E020");
    pub const SCRIPT_TOO_LARGE: Code = Code::new("E021");
    pub const READ_FAILURE: Code = Code::new("E022");
    pub const SYNTAX_ERROR: Code = Code::new("E023");
    pub const RUNTIME_ERROR: Code = Code::new("E024");
    pub const INVALID_PATTERN: Code = Code::new("E025");
    pub const UNSUPPORTED_VALUE: Code = Code::new("E026");
    pub const UNKNOWN_GLOBAL: Code = Code::new("E027");
}

/// Check lookup and invocation error codes
pub mod check {
    use super::Code;

    pub const UNKNOWN_CHECK: Code = Code::new("E030");
    pub const WRONG_SECTION: Code = Code::new("E031");
    pub const MISSING_FIELD: Code = Code::new("E032");
    pub const MALFORMED_REGISTRATION: Code = Code::new("E033");
    pub const EMPTY_MULTI_RESULT: Code = Code::new("E034");
    pub const MALFORMED_PARTIAL_RESULT: Code = Code::new("E035");
    pub const UNEXPECTED_RETURN: Code = Code::new("E036");
    pub const USAGE: Code = Code::new("E037");
}

/// Structural validation error codes
pub mod validation {
    use super::Code;

    pub const INVALID_RESULT: Code = Code::new("E040");
    pub const INVALID_PERFDATA: Code = Code::new("E041");
    pub const INVALID_INVENTORY: Code = Code::new("E042");
}

/// Agent execution error codes
pub mod agent {
    use super::Code;

    pub const MISSING_EXECUTABLE: Code = Code::new("E050");
    pub const SPAWN_FAILURE: Code = Code::new("E051");
    pub const NON_ZERO_EXIT: Code = Code::new("E052");
    pub const TIMEOUT: Code = Code::new("E053");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const SCRIPT_LOADED: Code = Code::new("I001");
    pub const SECTION_PARSED: Code = Code::new("I002");
    pub const INVENTORY_COMPLETED: Code = Code::new("I003");
    pub const CHECK_COMPLETED: Code = Code::new("I004");
    pub const VALIDATION_PASSED: Code = Code::new("I005");
    pub const AGENT_COMPLETED: Code = Code::new("I006");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

const METADATA: &[(&str, &str, Severity, &str)] = &[
    ("ERR001", "System", Severity::Critical, "Internal harness error"),
    ("E001", "Configuration", Severity::High, "Configuration file cannot be read"),
    ("E002", "Configuration", Severity::High, "Configuration value is invalid"),
    ("E010", "Section", Severity::Medium, "Test data does not start with a section header"),
    ("E011", "Section", Severity::Medium, "Section header option is malformed"),
    ("E012", "Section", Severity::Medium, "Test data contains more than one section"),
    ("E020", "Script", Severity::High, "Check-definition file does not exist"),
    ("E021", "Script", Severity::High, "Check-definition file exceeds size limit"),
    ("E022", "Script", Severity::High, "Check-definition file cannot be read"),
    ("E023", "Script", Severity::High, "Check-definition file does not compile"),
    ("E024", "Script", Severity::High, "Check-definition code raised an error"),
    ("E025", "Script", Severity::Medium, "Invalid regular expression passed to regex()"),
    ("E026", "Script", Severity::Medium, "Script value cannot cross into the harness"),
    ("E027", "Script", Severity::Medium, "Name is not bound in the check namespace"),
    ("E030", "Check", Severity::Medium, "Check is not registered in check_info"),
    ("E031", "Check", Severity::Medium, "Test data belongs to another section"),
    ("E032", "Check", Severity::Medium, "Registration record lacks a required field"),
    ("E033", "Check", Severity::Medium, "Registration record has the wrong shape"),
    ("E034", "Check", Severity::Medium, "Multi-result check produced no results"),
    ("E035", "Check", Severity::Medium, "Partial result cannot be merged"),
    ("E036", "Check", Severity::Medium, "Check function returned an unexpected value"),
    ("E037", "Usage", Severity::High, "Harness used without the required configuration"),
    ("E040", "Validation", Severity::Medium, "Check result is malformed"),
    ("E041", "Validation", Severity::Medium, "Perfdata entry is malformed"),
    ("E042", "Validation", Severity::Medium, "Inventory is malformed"),
    ("E050", "Agent", Severity::High, "Agent executable does not exist"),
    ("E051", "Agent", Severity::High, "Agent executable could not be started"),
    ("E052", "Agent", Severity::Medium, "Agent executable exited with failure"),
    ("E053", "Agent", Severity::Medium, "Agent executable timed out"),
];

/// Metadata registry using OnceLock for thread safety
static REGISTRY: OnceLock<HashMap<&'static str, CodeMetadata>> = OnceLock::new();

fn get_registry() -> &'static HashMap<&'static str, CodeMetadata> {
    REGISTRY.get_or_init(|| {
        METADATA
            .iter()
            .map(|&(code, category, severity, description)| {
                (
                    code,
                    CodeMetadata {
                        code,
                        category,
                        severity,
                        description,
                    },
                )
            })
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get metadata for a specific code
pub fn get_metadata(code: &str) -> Option<&'static CodeMetadata> {
    get_registry().get(code)
}

/// Get error severity from error code
pub fn get_severity(code: &str) -> Severity {
    get_metadata(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Get human-readable description for a code
pub fn get_description(code: &str) -> &'static str {
    get_metadata(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get category for a code
pub fn get_category(code: &str) -> &'static str {
    get_metadata(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
