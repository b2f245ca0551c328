//! Check lookup, invocation and result normalization
//!
//! A [`CheckFile`] wraps the namespace of one loaded check-definition file.
//! [`CheckFile::check`] resolves a dotted name such as `df.mounts` against
//! `check_info` and returns a [`Check`] view whose `inventory` and `check`
//! methods parse agent output and call into the script.
//!
//! Check functions registered with `multi_result = true` report partial
//! results; these are merged by [`merge_partial_results`].

mod descriptor;
mod error;
mod outcome;
mod params;

pub use descriptor::{Check, CheckFile};
pub use error::CheckError;
pub use outcome::{merge_partial_results, CheckOutcome};
pub use params::CheckParams;
