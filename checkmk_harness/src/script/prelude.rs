//! Symbols bound into every check namespace before the script runs

use super::error::PatternError;
use crate::config::constants::compile_time::script::REGEX_FUNCTION;
use mlua::{Lua, MetaMethod, Table, UserData, UserDataFields, UserDataMethods, Value};
use regex::{Captures, Regex};

/// Registration mappings checks are expected to fill
pub const MAPPING_CONTAINERS: &[&str] = &[
    "check_info",
    "checkgroup_of",
    "check_includes",
    "precompile_params",
    "check_default_levels",
    "factory_settings",
    "snmp_info",
    "snmp_scan_functions",
    "active_check_info",
    "special_agent_info",
];

/// Ordered sequences checks are expected to append to
pub const SEQUENCE_CONTAINERS: &[&str] = &["check_config_variables"];

/// Description of the pre-bound symbol set
///
/// Lua has a single table type, so mappings and sequences are both created
/// as empty tables; the split is kept so callers can tell what a check may
/// assume about each container.
#[derive(Debug, Clone)]
pub struct Prelude {
    mappings: Vec<String>,
    sequences: Vec<String>,
}

impl Default for Prelude {
    fn default() -> Self {
        Self {
            mappings: MAPPING_CONTAINERS.iter().map(|s| s.to_string()).collect(),
            sequences: SEQUENCE_CONTAINERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Prelude {
    /// Add another empty mapping container
    pub fn with_mapping(mut self, name: impl Into<String>) -> Self {
        self.mappings.push(name.into());
        self
    }

    /// Add another empty sequence container
    pub fn with_sequence(mut self, name: impl Into<String>) -> Self {
        self.sequences.push(name.into());
        self
    }

    pub fn mappings(&self) -> &[String] {
        &self.mappings
    }

    pub fn sequences(&self) -> &[String] {
        &self.sequences
    }

    /// Populate `env` with fresh containers and the `regex` function
    pub fn install(&self, lua: &Lua, env: &Table) -> mlua::Result<()> {
        for name in self.mappings.iter().chain(self.sequences.iter()) {
            env.raw_set(name.as_str(), lua.create_table()?)?;
        }

        let regex = lua.create_function(|_, pattern: String| {
            CompiledPattern::new(&pattern).map_err(mlua::Error::external)
        })?;
        env.raw_set(REGEX_FUNCTION, regex)
    }
}

/// Compiled regular expression handed to scripts by `regex(pattern)`
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: String,
    regex: Regex,
    anchored: Regex,
}

impl CompiledPattern {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let invalid = |e: regex::Error| PatternError {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        };
        let regex = Regex::new(pattern).map_err(invalid)?;
        let anchored = Regex::new(&format!(r"\A(?:{})", pattern)).map_err(invalid)?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            anchored,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn has_groups(&self) -> bool {
        self.regex.captures_len() > 1
    }

    /// Capture groups as a sequence, or the whole match when there are none
    fn captures_table(&self, lua: &Lua, captures: &Captures) -> mlua::Result<Table> {
        let table = lua.create_table()?;
        if self.has_groups() {
            for index in 1..captures.len() {
                if let Some(group) = captures.get(index) {
                    table.raw_set(index, group.as_str())?;
                }
            }
        } else if let Some(whole) = captures.get(0) {
            table.raw_set(1, whole.as_str())?;
        }
        Ok(table)
    }

    fn matched(&self, lua: &Lua, regex: &Regex, text: &str) -> mlua::Result<Value> {
        match regex.captures(text) {
            Some(captures) => Ok(Value::Table(self.captures_table(lua, &captures)?)),
            None => Ok(Value::Nil),
        }
    }

    /// Every non-overlapping match: whole matches without groups, the
    /// single group with one group, otherwise one table per match
    fn find_all(&self, lua: &Lua, text: &str) -> mlua::Result<Table> {
        let results = lua.create_table()?;
        let groups = self.regex.captures_len() - 1;
        for (position, captures) in self.regex.captures_iter(text).enumerate() {
            let value = match groups {
                0 => Value::String(lua.create_string(&captures[0])?),
                1 => Value::String(lua.create_string(
                    captures.get(1).map(|m| m.as_str()).unwrap_or_default(),
                )?),
                _ => Value::Table(self.captures_table(lua, &captures)?),
            };
            results.raw_set(position + 1, value)?;
        }
        Ok(results)
    }
}

impl UserData for CompiledPattern {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("pattern", |_, this| Ok(this.pattern.clone()));
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("is_match", |_, this, text: String| Ok(this.regex.is_match(&text)));
        methods.add_method("match", |lua, this, text: String| {
            this.matched(lua, &this.anchored, &text)
        });
        methods.add_method("search", |lua, this, text: String| {
            this.matched(lua, &this.regex, &text)
        });
        methods.add_method("find_all", |lua, this, text: String| this.find_all(lua, &text));
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("regex('{}')", this.pattern))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::error::ScriptError;

    fn installed() -> (Lua, Table) {
        let lua = Lua::new();
        let env = lua.create_table().unwrap();
        Prelude::default().install(&lua, &env).unwrap();
        (lua, env)
    }

    fn run<T: mlua::FromLuaMulti>(lua: &Lua, env: &Table, source: &str) -> mlua::Result<T> {
        lua.load(source).set_environment(env.clone()).eval()
    }

    #[test]
    fn test_containers_start_empty() {
        let (_lua, env) = installed();
        for name in MAPPING_CONTAINERS.iter().chain(SEQUENCE_CONTAINERS) {
            let table: Table = env.raw_get(*name).unwrap();
            assert_eq!(table.raw_len(), 0, "{} should be empty", name);
            assert!(table.pairs::<Value, Value>().next().is_none());
        }
    }

    #[test]
    fn test_extra_containers() {
        let lua = Lua::new();
        let env = lua.create_table().unwrap();
        let prelude = Prelude::default()
            .with_mapping("inventory_processes")
            .with_sequence("extra_sections");
        prelude.install(&lua, &env).unwrap();

        assert!(env.raw_get::<Table>("inventory_processes").is_ok());
        assert!(env.raw_get::<Table>("extra_sections").is_ok());
        assert_eq!(prelude.sequences().len(), 2);
    }

    #[test]
    fn test_regex_methods() {
        let (lua, env) = installed();
        let ok: bool = run(&lua, &env, "return regex('^[0-9]+$'):is_match('123')").unwrap();
        assert!(ok);

        let (a, b): (String, String) = run(
            &lua,
            &env,
            "local m = regex('(\\\\w+)=(\\\\d+)'):match('load=42') return m[1], m[2]",
        )
        .unwrap();
        assert_eq!((a.as_str(), b.as_str()), ("load", "42"));

        let anchored: Value = run(&lua, &env, "return regex('b'):match('abc')").unwrap();
        assert!(anchored.is_nil());

        let found: String = run(&lua, &env, "return regex('b'):search('abc')[1]").unwrap();
        assert_eq!(found, "b");

        let count: i64 = run(&lua, &env, "return #regex('\\\\d'):find_all('a1b2c3')").unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_invalid_pattern_is_readable() {
        let (lua, env) = installed();
        let error = run::<Value>(&lua, &env, "return regex('(')").unwrap_err();
        assert!(error.to_string().contains("Invalid regular expression '(':"));

        match ScriptError::from_lua(error) {
            ScriptError::InvalidPattern(pattern) => assert_eq!(pattern.pattern, "("),
            other => panic!("Expected InvalidPattern, got {:?}", other),
        }
    }

    #[test]
    fn test_compiled_pattern_rejects_bad_input() {
        let error = CompiledPattern::new("[a-").unwrap_err();
        assert_eq!(error.pattern, "[a-");
        assert!(CompiledPattern::new("a|b").is_ok());
    }
}
