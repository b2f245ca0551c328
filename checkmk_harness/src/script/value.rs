//! Values crossing between check scripts and the harness

use super::error::{ScriptError, ScriptResult};
use crate::config::constants::compile_time::script::{MAX_SEQUENCE_INDEX, MAX_VALUE_DEPTH};
use mlua::{Lua, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Harness-side copy of a script value
///
/// Lua integers and floats stay distinct. Tables whose keys are all positive
/// integers become `List` (holes read as `Nil`); any other table becomes
/// `Table` with stringified keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScriptValue {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ScriptValue>),
    Table(BTreeMap<String, ScriptValue>),
}

impl ScriptValue {
    pub fn is_nil(&self) -> bool {
        matches!(self, ScriptValue::Nil)
    }

    /// Integer or float
    pub fn is_number(&self) -> bool {
        matches!(self, ScriptValue::Integer(_) | ScriptValue::Float(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ScriptValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ScriptValue]> {
        match self {
            ScriptValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Empty list or empty table
    pub fn is_empty_container(&self) -> bool {
        match self {
            ScriptValue::List(items) => items.is_empty(),
            ScriptValue::Table(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Nil => "nil",
            ScriptValue::Boolean(_) => "boolean",
            ScriptValue::Integer(_) => "integer",
            ScriptValue::Float(_) => "float",
            ScriptValue::String(_) => "string",
            ScriptValue::List(_) => "list",
            ScriptValue::Table(_) => "table",
        }
    }

    /// List of strings, e.g. one row of a parsed section
    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptValue::List(
            items
                .into_iter()
                .map(|s| ScriptValue::String(s.into()))
                .collect(),
        )
    }

    /// Copy an interpreter value into the harness
    pub fn from_lua(value: &Value) -> ScriptResult<Self> {
        Self::from_lua_at_depth(value, 0)
    }

    fn from_lua_at_depth(value: &Value, depth: usize) -> ScriptResult<Self> {
        if depth > MAX_VALUE_DEPTH {
            return Err(ScriptError::NestingTooDeep {
                max_depth: MAX_VALUE_DEPTH,
            });
        }

        match value {
            Value::Nil => Ok(ScriptValue::Nil),
            Value::Boolean(b) => Ok(ScriptValue::Boolean(*b)),
            Value::Integer(i) => Ok(ScriptValue::Integer(*i)),
            Value::Number(n) => Ok(ScriptValue::Float(*n)),
            Value::String(s) => Ok(ScriptValue::String(s.to_string_lossy().to_string())),
            Value::Table(table) => {
                let mut entries = Vec::new();
                for pair in table.clone().pairs::<Value, Value>() {
                    let (key, item) = pair.map_err(ScriptError::from_lua)?;
                    entries.push((key, Self::from_lua_at_depth(&item, depth + 1)?));
                }
                Self::from_entries(entries)
            }
            other => Err(ScriptError::UnsupportedValue {
                type_name: other.type_name().to_string(),
            }),
        }
    }

    fn from_entries(entries: Vec<(Value, ScriptValue)>) -> ScriptResult<Self> {
        let sequence_len = entries.iter().try_fold(0i64, |max, (key, _)| match key {
            Value::Integer(i) if *i >= 1 && *i <= MAX_SEQUENCE_INDEX => Some(max.max(*i)),
            _ => None,
        });

        if let Some(len) = sequence_len {
            let mut items = vec![ScriptValue::Nil; len as usize];
            for (key, item) in entries {
                if let Value::Integer(i) = key {
                    items[(i - 1) as usize] = item;
                }
            }
            return Ok(ScriptValue::List(items));
        }

        let mut map = BTreeMap::new();
        for (key, item) in entries {
            let key = match key {
                Value::String(s) => s.to_string_lossy().to_string(),
                Value::Integer(i) => i.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(ScriptError::UnsupportedValue {
                        type_name: format!("{} table key", other.type_name()),
                    })
                }
            };
            map.insert(key, item);
        }
        Ok(ScriptValue::Table(map))
    }

    /// Build the interpreter value handed to script functions
    pub fn to_lua(&self, lua: &Lua) -> mlua::Result<Value> {
        Ok(match self {
            ScriptValue::Nil => Value::Nil,
            ScriptValue::Boolean(b) => Value::Boolean(*b),
            ScriptValue::Integer(i) => Value::Integer(*i),
            ScriptValue::Float(f) => Value::Number(*f),
            ScriptValue::String(s) => Value::String(lua.create_string(s)?),
            ScriptValue::List(items) => {
                let table = lua.create_table_with_capacity(items.len(), 0)?;
                for (index, item) in items.iter().enumerate() {
                    table.raw_set(index + 1, item.to_lua(lua)?)?;
                }
                Value::Table(table)
            }
            ScriptValue::Table(map) => {
                let table = lua.create_table_with_capacity(0, map.len())?;
                for (key, item) in map {
                    table.raw_set(key.as_str(), item.to_lua(lua)?)?;
                }
                Value::Table(table)
            }
        })
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Nil => write!(f, "nil"),
            ScriptValue::Boolean(b) => write!(f, "{}", b),
            ScriptValue::Integer(i) => write!(f, "{}", i),
            ScriptValue::Float(fl) => write!(f, "{:?}", fl),
            ScriptValue::String(s) => write!(f, "{:?}", s),
            ScriptValue::List(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            ScriptValue::Table(map) => {
                write!(f, "{{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", key, item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::String(s.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        ScriptValue::String(s)
    }
}

impl From<i64> for ScriptValue {
    fn from(i: i64) -> Self {
        ScriptValue::Integer(i)
    }
}

impl From<f64> for ScriptValue {
    fn from(f: f64) -> Self {
        ScriptValue::Float(f)
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Boolean(b)
    }
}

impl<T: Into<ScriptValue>> From<Option<T>> for ScriptValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ScriptValue::Nil)
    }
}

impl From<Vec<ScriptValue>> for ScriptValue {
    fn from(items: Vec<ScriptValue>) -> Self {
        ScriptValue::List(items)
    }
}
