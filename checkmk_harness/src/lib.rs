//! # Check_MK Check Harness
//!
//! Loads check-definition files, feeds them agent output and validates what
//! the checks report against the monitoring core's result contract.

#[macro_use]
pub mod logging;

pub mod agent;
pub mod api;
pub mod check;
pub mod config;
pub mod results;
pub mod script;
pub mod section;
pub mod validation;

// Convenience re-exports
pub use api::*;
pub use section::{parse_section, ParsedSection, SectionHeader};

pub mod prelude {
    pub use crate::api::{ErrorKind, Harness, HarnessError};

    pub use crate::agent::{Agent, AgentDirectory, AgentError, AgentOutput};
    pub use crate::check::{
        merge_partial_results, Check, CheckError, CheckFile, CheckOutcome, CheckParams,
    };
    pub use crate::config::{ConfigError, HarnessPreferences, LogLevel};
    pub use crate::results::{CheckResult, InventoryEntry, PerfdataEntry, Status};
    pub use crate::script::{Namespace, ScriptError, ScriptLoader, ScriptValue};
    pub use crate::section::{parse_section, ParsedSection, SectionError};

    pub use crate::validation::{
        validate_inventory, validate_inventory_and_check, validate_perfdata_entry,
        validate_result, CheckContract, CheckRunner, ValidationError,
    };
}
