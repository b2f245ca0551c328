//! Check-definition script loading
//!
//! Check files are Lua chunks. Each load builds a fresh interpreter and an
//! environment table seeded by the [`Prelude`] (registration containers and
//! the `regex` helper), then runs the file inside it. The resulting
//! [`Namespace`] is what check lookup and invocation work against.

mod error;
mod loader;
mod namespace;
mod prelude;
mod value;

pub use error::{PatternError, ScriptError, ScriptResult};
pub use loader::ScriptLoader;
pub use namespace::Namespace;
pub use prelude::{CompiledPattern, Prelude, MAPPING_CONTAINERS, SEQUENCE_CONTAINERS};
pub use value::ScriptValue;
