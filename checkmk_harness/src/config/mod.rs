//! Configuration module for the check harness
//!
//! Compile-time constants live in [`constants`]; user preferences that may
//! change between runs live in [`runtime`].

pub mod constants;
pub mod runtime;

pub use runtime::{ConfigError, HarnessPreferences, LogLevel};

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the crate version the harness was built from
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("CHECKMK_HARNESS_BUILD_PROFILE").unwrap_or("development")
    }
}
