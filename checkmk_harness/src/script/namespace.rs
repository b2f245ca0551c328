//! Loaded check-definition namespace

use super::error::{ScriptError, ScriptResult};
use super::value::ScriptValue;
use crate::config::constants::compile_time::script::CHECK_REGISTRY;
use mlua::{Function, Lua, Table, Value, Variadic};
use std::path::{Path, PathBuf};

/// One executed check-definition file
///
/// Owns its interpreter; dropping the namespace releases everything the
/// script created. Nothing is shared between namespaces.
pub struct Namespace {
    lua: Lua,
    env: Table,
    name: String,
    path: PathBuf,
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Namespace {
    pub(crate) fn new(lua: Lua, env: Table, name: String, path: PathBuf) -> Self {
        Self {
            lua,
            env,
            name,
            path,
        }
    }

    /// Module identifier the file was loaded under
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw binding, `nil` when the script never defined it
    pub(crate) fn raw_global(&self, name: &str) -> ScriptResult<Value> {
        self.env.raw_get(name).map_err(ScriptError::from_lua)
    }

    /// Whether the script (or the prelude) bound `name` to a non-nil value
    ///
    /// Standard library fallbacks do not count.
    pub fn has_global(&self, name: &str) -> bool {
        matches!(self.raw_global(name), Ok(value) if !value.is_nil())
    }

    /// The global itself, not a copy
    pub(crate) fn live_global(&self, name: &str) -> ScriptResult<Value> {
        match self.raw_global(name)? {
            Value::Nil => Err(ScriptError::unknown_global(name)),
            value => Ok(value),
        }
    }

    /// Copy of a global value
    pub fn global(&self, name: &str) -> ScriptResult<ScriptValue> {
        ScriptValue::from_lua(&self.live_global(name)?)
    }

    /// Call a global function by name and copy its first return value
    pub fn call(&self, function_name: &str, args: &[ScriptValue]) -> ScriptResult<ScriptValue> {
        let function = match self.raw_global(function_name)? {
            Value::Function(function) => function,
            Value::Nil => return Err(ScriptError::unknown_global(function_name)),
            other => {
                return Err(ScriptError::runtime(format!(
                    "'{}' is a {}, not a function",
                    function_name,
                    other.type_name()
                )))
            }
        };
        let args = args
            .iter()
            .map(|arg| self.to_lua(arg))
            .collect::<ScriptResult<Vec<_>>>()?;
        let value = self.call_function(&function, args)?;
        ScriptValue::from_lua(&value)
    }

    /// Build an interpreter value owned by this namespace
    pub(crate) fn to_lua(&self, value: &ScriptValue) -> ScriptResult<Value> {
        value.to_lua(&self.lua).map_err(ScriptError::from_lua)
    }

    /// Call a function value; arguments are passed as they are
    pub(crate) fn call_function(&self, function: &Function, args: Vec<Value>) -> ScriptResult<Value> {
        function
            .call::<Value>(args.into_iter().collect::<Variadic<Value>>())
            .map_err(ScriptError::from_lua)
    }

    /// The `check_info` registration table
    pub(crate) fn registry(&self) -> ScriptResult<Table> {
        match self.raw_global(CHECK_REGISTRY)? {
            Value::Table(table) => Ok(table),
            other => Err(ScriptError::runtime(format!(
                "'{}' is a {}, not a table",
                CHECK_REGISTRY,
                other.type_name()
            ))),
        }
    }

    /// Dotted names registered in `check_info`, sorted
    pub fn registered_checks(&self) -> ScriptResult<Vec<String>> {
        let mut names = Vec::new();
        for pair in self.registry()?.pairs::<Value, Value>() {
            let (key, _) = pair.map_err(ScriptError::from_lua)?;
            if let Value::String(name) = key {
                names.push(name.to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
