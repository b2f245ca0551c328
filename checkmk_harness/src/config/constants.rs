pub mod compile_time {
    pub mod section {
        /// Opening marker of a section header line
        pub const HEADER_START: &str = "<<<";

        /// Closing marker of a section header line
        pub const HEADER_END: &str = ">>>";

        /// Separates the section name and its options inside the header
        pub const OPTION_DELIMITER: char = ':';

        /// Option carrying the field separator as a decimal character code
        pub const SEPARATOR_OPTION: &str = "sep";

        /// Option requesting that data lines are not trimmed
        pub const NOSTRIP_OPTION: &str = "nostrip";
    }

    pub mod script {
        /// Maximum size of a check-definition file (4MB)
        /// SECURITY: check files are small; anything larger is not a check
        pub const MAX_SCRIPT_SIZE: u64 = 4 * 1024 * 1024;

        /// Maximum nesting depth when converting interpreter values
        /// SECURITY: self-referencing tables would otherwise recurse forever
        pub const MAX_VALUE_DEPTH: usize = 64;

        /// Largest integer key still treated as a sequence index
        pub const MAX_SEQUENCE_INDEX: i64 = 1_000_000;

        /// Name under which the pattern compiler is pre-bound
        pub const REGEX_FUNCTION: &str = "regex";

        /// Registration mapping holding the check descriptors
        pub const CHECK_REGISTRY: &str = "check_info";
    }

    pub mod check {
        /// Joins the messages of merged partial results
        pub const MESSAGE_SEPARATOR: &str = ", ";

        /// Appended to every partial message whose status is not OK
        pub const NON_OK_MARKER: &str = "(!!)";

        /// Placeholder marking a service description as multi-item
        pub const MULTI_ITEM_PLACEHOLDER: &str = "%s";

        /// Registration record field names
        pub const FIELD_CHECK_FUNCTION: &str = "check_function";
        pub const FIELD_INVENTORY_FUNCTION: &str = "inventory_function";
        pub const FIELD_SERVICE_DESCRIPTION: &str = "service_description";
        pub const FIELD_HAS_PERFDATA: &str = "has_perfdata";
        pub const FIELD_MULTI_RESULT: &str = "multi_result";
    }

    pub mod validation {
        /// Lowest valid status code (OK)
        pub const MIN_STATUS: i64 = 0;

        /// Highest valid status code (UNKNOWN)
        pub const MAX_STATUS: i64 = 3;

        /// Shortest valid perfdata entry: label and value
        pub const MIN_PERFDATA_FIELDS: usize = 2;

        /// Longest valid perfdata entry: label, value, warn, crit, min, max
        pub const MAX_PERFDATA_FIELDS: usize = 6;

        /// Result length without perfdata
        pub const RESULT_LEN_PLAIN: usize = 2;

        /// Result length with perfdata
        pub const RESULT_LEN_WITH_PERFDATA: usize = 3;
    }

    pub mod harness {
        /// Directory holding check-definition files
        pub const DEFAULT_CHECKS_DIR: &str = "checks";

        /// Directory holding agent executables
        pub const DEFAULT_AGENTS_DIR: &str = "agents";

        /// Sub-directory of the agents directory holding agent plugins
        pub const AGENT_PLUGINS_DIR: &str = "plugins";

        /// Default timeout for agent executables in seconds
        pub const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 30;

        /// Upper bound accepted for the agent timeout preference
        pub const MAX_AGENT_TIMEOUT_SECS: u64 = 3600;
    }
}

// Re-export for convenience
pub use compile_time::*;
