//! Check-definition script loader

use super::error::{ScriptError, ScriptResult};
use super::namespace::Namespace;
use super::prelude::Prelude;
use crate::config::constants::compile_time::script::MAX_SCRIPT_SIZE;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};
use mlua::Lua;
use std::fs;
use std::path::Path;

/// Loads check-definition files into fresh namespaces
///
/// Every call re-reads and recompiles the file; nothing is cached.
#[derive(Debug, Clone)]
pub struct ScriptLoader {
    prelude: Prelude,
    max_size: u64,
}

impl Default for ScriptLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptLoader {
    pub fn new() -> Self {
        Self {
            prelude: Prelude::default(),
            max_size: MAX_SCRIPT_SIZE,
        }
    }

    /// Use a different pre-bound symbol set
    pub fn with_prelude(mut self, prelude: Prelude) -> Self {
        self.prelude = prelude;
        self
    }

    pub fn prelude(&self) -> &Prelude {
        &self.prelude
    }

    /// Load the file at `path` under the module identifier `name`
    pub fn load(&self, name: &str, path: &Path) -> ScriptResult<Namespace> {
        if !path.is_file() {
            let error = ScriptError::missing_file(path);
            log_error!(error.error_code(), "Check file not found",
                "path" => path.display());
            return Err(error);
        }

        let metadata = fs::metadata(path).map_err(|e| ScriptError::io(path, &e))?;
        if metadata.len() > self.max_size {
            let error = ScriptError::TooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                max: self.max_size,
            };
            log_error!(error.error_code(), "Check file exceeds size limit",
                "path" => path.display(),
                "size" => metadata.len());
            return Err(error);
        }

        let source = fs::read_to_string(path).map_err(|e| {
            let error = ScriptError::io(path, &e);
            log_error!(error.error_code(), "Failed to read check file",
                "path" => path.display(),
                "error" => &e);
            error
        })?;

        self.load_source(name, path, &source)
    }

    /// Execute `source` as if it had been read from `path`
    ///
    /// The prelude is installed first, then the chunk runs with the
    /// namespace as its environment and as its single argument.
    pub fn load_source(&self, name: &str, path: &Path, source: &str) -> ScriptResult<Namespace> {
        let lua = Lua::new();
        let env = self.environment(&lua).map_err(ScriptError::from_lua)?;

        let chunk = lua
            .load(source)
            .set_name(format!("@{}", path.display()))
            .set_environment(env.clone())
            .into_function()
            .map_err(|e| {
                let error = ScriptError::from_compile(path, e);
                log_error!(error.error_code(), "Check file does not compile",
                    "path" => path.display(),
                    "error" => &error);
                error
            })?;

        log_debug!("Executing check file", "name" => name, "path" => path.display());

        chunk.call::<()>(env.clone()).map_err(|e| {
            let error = ScriptError::from_lua(e);
            log_error!(error.error_code(), "Check file raised an error while loading",
                "path" => path.display(),
                "error" => &error);
            error
        })?;

        log_success!(codes::success::SCRIPT_LOADED, "Check file loaded",
            "name" => name,
            "path" => path.display());

        Ok(Namespace::new(lua, env, name.to_string(), path.to_path_buf()))
    }

    /// Fresh environment table: prelude bindings plus read-only fallback to
    /// the standard library
    fn environment(&self, lua: &Lua) -> mlua::Result<mlua::Table> {
        let env = lua.create_table()?;
        let fallback = lua.create_table()?;
        fallback.raw_set("__index", lua.globals())?;
        env.set_metatable(Some(fallback));
        self.prelude.install(lua, &env)?;
        Ok(env)
    }
}
