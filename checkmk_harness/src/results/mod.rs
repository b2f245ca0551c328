//! # Check Results Module
//!
//! Typed canonical results produced by the structural validators:
//! - [`Status`] - monitoring state 0..=3
//! - [`CheckResult`] - status, message and optional perfdata
//! - [`PerfdataEntry`] - one metric with optional thresholds
//! - [`InventoryEntry`] - one discovered item

pub mod types;

pub use types::{CheckResult, InventoryEntry, Number, PerfValue, PerfdataEntry, Status};
