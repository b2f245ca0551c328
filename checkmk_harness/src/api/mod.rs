//! # Public API for check tests
//!
//! [`Harness`] resolves check files and agent plugins for the check under
//! test; [`HarnessError`] unifies the module errors and classifies them by
//! [`ErrorKind`].

pub mod errors;
pub mod harness;

pub use errors::{ErrorKind, HarnessError};
pub use harness::Harness;
