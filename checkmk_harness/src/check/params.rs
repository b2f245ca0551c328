//! Parameters handed to check functions

use crate::script::ScriptValue;
use std::fmt;

/// What a check function receives as its `params` argument
///
/// `Global` is resolved in the check's own namespace at call time, so the
/// function gets the script's table itself (positional and keyed entries,
/// functions, identity) rather than a copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CheckParams {
    #[default]
    None,
    /// Value built by the caller
    Value(ScriptValue),
    /// Named global of the check's namespace
    Global(String),
}

impl CheckParams {
    pub fn global(name: impl Into<String>) -> Self {
        CheckParams::Global(name.into())
    }

    /// Name of the referenced global, if any
    pub fn global_name(&self) -> Option<&str> {
        match self {
            CheckParams::Global(name) => Some(name),
            _ => None,
        }
    }
}

impl From<ScriptValue> for CheckParams {
    fn from(value: ScriptValue) -> Self {
        if value.is_nil() {
            CheckParams::None
        } else {
            CheckParams::Value(value)
        }
    }
}

impl fmt::Display for CheckParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckParams::None => write!(f, "nil"),
            CheckParams::Value(value) => write!(f, "{}", value),
            CheckParams::Global(name) => write!(f, "{}", name),
        }
    }
}
