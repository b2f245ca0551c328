//! Check descriptor lookup and invocation

use super::error::CheckError;
use super::outcome::CheckOutcome;
use super::params::CheckParams;
use crate::config::constants::compile_time::check::{
    FIELD_CHECK_FUNCTION, FIELD_HAS_PERFDATA, FIELD_INVENTORY_FUNCTION, FIELD_MULTI_RESULT,
    FIELD_SERVICE_DESCRIPTION,
};
use crate::logging::codes;
use crate::script::{Namespace, ScriptError, ScriptLoader, ScriptValue};
use crate::section::{parse_section, ParsedSection};
use crate::validation::{CheckContract, CheckRunner};
use crate::{log_debug, log_error, log_success};
use mlua::{Function, Table, Value};
use std::path::Path;

/// A loaded check-definition file, addressed by its section name
#[derive(Debug)]
pub struct CheckFile {
    namespace: Namespace,
}

impl CheckFile {
    pub fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    /// Load `path` as the check file for section `name`
    pub fn load(loader: &ScriptLoader, name: &str, path: &Path) -> Result<Self, CheckError> {
        Ok(Self::new(loader.load(name, path)?))
    }

    /// Section the file was loaded for
    pub fn name(&self) -> &str {
        self.namespace.name()
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Dotted names registered by the file, sorted
    pub fn check_names(&self) -> Result<Vec<String>, CheckError> {
        Ok(self.namespace.registered_checks()?)
    }

    /// Resolve the check registered under the dotted `name`
    ///
    /// The part before the first `.` must be this file's section.
    pub fn check(&self, name: &str) -> Result<Check<'_>, CheckError> {
        let section = name.split('.').next().unwrap_or_default();
        if section != self.name() {
            let error = CheckError::ForeignCheck {
                name: name.to_string(),
                file: self.name().to_string(),
            };
            log_error!(error.error_code(), "Check does not belong to this check file",
                "check" => name,
                "file" => self.name());
            return Err(error);
        }

        let registration = self
            .namespace
            .registry()?
            .raw_get::<Value>(name)
            .map_err(ScriptError::from_lua)?;

        match registration {
            Value::Table(info) => Ok(Check {
                file: self,
                name: name.to_string(),
                section: section.to_string(),
                info,
            }),
            Value::Nil => {
                let error = CheckError::UnknownCheck {
                    name: name.to_string(),
                    file: self.name().to_string(),
                };
                log_error!(error.error_code(), "Check is not registered",
                    "check" => name,
                    "path" => self.namespace.path().display());
                Err(error)
            }
            other => Err(CheckError::malformed_registration(
                name,
                format!("expected a table, got {}", other.type_name()),
            )),
        }
    }
}

/// View of one `check_info` registration
///
/// Reads go to the live registration table, so changes made by script code
/// after lookup are visible.
pub struct Check<'a> {
    file: &'a CheckFile,
    name: String,
    section: String,
    info: Table,
}

impl std::fmt::Debug for Check<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("section", &self.section)
            .finish_non_exhaustive()
    }
}

impl<'a> Check<'a> {
    /// Dotted check name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Section the check consumes
    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn file(&self) -> &'a CheckFile {
        self.file
    }

    fn field(&self, field: &str) -> Value {
        self.info.raw_get(field).unwrap_or(Value::Nil)
    }

    fn flag(&self, field: &str) -> bool {
        !matches!(self.field(field), Value::Nil | Value::Boolean(false))
    }

    fn function(&self, field: &'static str) -> Result<Function, CheckError> {
        match self.field(field) {
            Value::Function(function) => Ok(function),
            Value::Nil => Err(CheckError::missing_field(&self.name, field)),
            other => Err(CheckError::malformed_registration(
                &self.name,
                format!("'{}' is a {}, not a function", field, other.type_name()),
            )),
        }
    }

    /// `has_perfdata` flag, false when absent
    pub fn has_perfdata(&self) -> bool {
        self.flag(FIELD_HAS_PERFDATA)
    }

    /// `multi_result` flag, false when absent
    pub fn is_multi_result(&self) -> bool {
        self.flag(FIELD_MULTI_RESULT)
    }

    /// Service description template
    pub fn service_description(&self) -> Result<String, CheckError> {
        match self.field(FIELD_SERVICE_DESCRIPTION) {
            Value::String(s) => Ok(s.to_string_lossy().to_string()),
            Value::Nil => Err(CheckError::missing_field(&self.name, FIELD_SERVICE_DESCRIPTION)),
            other => Err(CheckError::malformed_registration(
                &self.name,
                format!("service description is a {}, not a string", other.type_name()),
            )),
        }
    }

    /// Call the inventory function with the section rows
    pub fn run_inventory(&self, section: &ParsedSection) -> Result<ScriptValue, CheckError> {
        let function = self.function(FIELD_INVENTORY_FUNCTION)?;
        log_debug!("Running inventory", "check" => &self.name, "rows" => section.rows.len());

        let namespace = &self.file.namespace;
        let rows = namespace.to_lua(&section_rows(section))?;
        let value = namespace.call_function(&function, vec![rows])?;
        let inventory = ScriptValue::from_lua(&value)?;

        log_success!(codes::success::INVENTORY_COMPLETED, "Inventory completed",
            "check" => &self.name);
        Ok(inventory)
    }

    /// Call the check function and collapse multi results
    pub fn run_check(
        &self,
        item: Option<&str>,
        params: &CheckParams,
        section: &ParsedSection,
    ) -> Result<ScriptValue, CheckError> {
        let function = self.function(FIELD_CHECK_FUNCTION)?;
        log_debug!("Running check",
            "check" => &self.name,
            "item" => item.unwrap_or("-"),
            "params" => params,
            "multi_result" => self.is_multi_result());

        let namespace = &self.file.namespace;
        let params = match params {
            CheckParams::None => Value::Nil,
            CheckParams::Value(value) => namespace.to_lua(value)?,
            CheckParams::Global(name) => namespace.live_global(name)?,
        };
        let value = namespace.call_function(
            &function,
            vec![
                namespace.to_lua(&ScriptValue::from(item))?,
                params,
                namespace.to_lua(&section_rows(section))?,
            ],
        )?;

        let outcome = if self.is_multi_result() {
            CheckOutcome::Multiple(self.collect_partials(value)?)
        } else {
            CheckOutcome::Single(ScriptValue::from_lua(&value)?)
        };

        let result = outcome.into_result(&self.name, self.has_perfdata()).map_err(|e| {
            log_error!(e.error_code(), "Check results could not be merged",
                "check" => &self.name,
                "error" => &e);
            e
        })?;

        log_success!(codes::success::CHECK_COMPLETED, "Check completed",
            "check" => &self.name);
        Ok(result)
    }

    /// Drain a multi-result return value: a list of partial results, or an
    /// iterator function called until it yields `nil`
    fn collect_partials(&self, value: Value) -> Result<Vec<ScriptValue>, CheckError> {
        match value {
            Value::Function(next) => {
                let mut partials = Vec::new();
                loop {
                    let partial = next.call::<Value>(()).map_err(ScriptError::from_lua)?;
                    if partial.is_nil() {
                        break;
                    }
                    partials.push(ScriptValue::from_lua(&partial)?);
                }
                Ok(partials)
            }
            Value::Table(table) => match ScriptValue::from_lua(&Value::Table(table))? {
                ScriptValue::List(partials) => Ok(partials),
                other => Err(self.unexpected_return(other.type_name())),
            },
            other => Err(self.unexpected_return(other.type_name())),
        }
    }

    fn unexpected_return(&self, found: &str) -> CheckError {
        CheckError::UnexpectedReturn {
            check: self.name.clone(),
            function: FIELD_CHECK_FUNCTION,
            found: found.to_string(),
            expected: "list of results or iterator",
        }
    }

    /// Parse raw agent output and make sure it belongs to this check
    pub fn parse(&self, raw: &str) -> Result<ParsedSection, CheckError> {
        let section = parse_section(raw.trim())?;
        if section.name() != self.section {
            let error = CheckError::WrongSection {
                expected: self.section.clone(),
                got: section.name().to_string(),
            };
            log_error!(error.error_code(), "Test data is for another section",
                "check" => &self.name,
                "expected" => &self.section,
                "got" => section.name());
            return Err(error);
        }
        Ok(section)
    }

    /// Inventory of raw agent output
    pub fn inventory(&self, raw: &str) -> Result<ScriptValue, CheckError> {
        let section = self.parse(raw)?;
        self.run_inventory(&section)
    }

    /// Check result for raw agent output
    pub fn check(
        &self,
        item: Option<&str>,
        params: &CheckParams,
        raw: &str,
    ) -> Result<ScriptValue, CheckError> {
        let section = self.parse(raw)?;
        self.run_check(item, params, &section)
    }
}

/// Section rows as the list of string lists check functions receive
fn section_rows(section: &ParsedSection) -> ScriptValue {
    ScriptValue::List(
        section
            .rows
            .iter()
            .map(|row| ScriptValue::string_list(row.iter().cloned()))
            .collect(),
    )
}

impl CheckContract for Check<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_perfdata(&self) -> bool {
        Check::has_perfdata(self)
    }

    fn service_description(&self) -> Option<String> {
        Check::service_description(self).ok()
    }

    fn has_global(&self, name: &str) -> bool {
        self.file.namespace.has_global(name)
    }
}

impl CheckRunner for Check<'_> {
    fn inventory(&self, raw: &str) -> Result<ScriptValue, CheckError> {
        Check::inventory(self, raw)
    }

    fn check(
        &self,
        item: Option<&str>,
        params: &CheckParams,
        raw: &str,
    ) -> Result<ScriptValue, CheckError> {
        Check::check(self, item, params, raw)
    }

    fn default_params(&self, name: &str) -> Result<CheckParams, CheckError> {
        if !self.file.namespace.has_global(name) {
            return Err(ScriptError::unknown_global(name).into());
        }
        Ok(CheckParams::global(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::TempDir;

    const EXAMPLE_CHECK: &str = r#"
example_default_levels = {warn = 80, crit = 90}

function inventory_example(info)
  local inventory = {}
  for _, row in ipairs(info) do
    table.insert(inventory, tonumber(row[1]) * 2)
  end
  return inventory
end

function check_example(item, params, info)
  return {0, 'item ' .. tostring(item) .. ' warn ' .. tostring(params and params.warn)}
end

check_info['example'] = {
  inventory_function = inventory_example,
  check_function = check_example,
  service_description = 'Example',
}

check_info['example.multi'] = {
  check_function = function(item, params, info)
    return coroutine.wrap(function()
      coroutine.yield({0, 'ok'})
      coroutine.yield({2, 'broken', {'perf-data'}})
    end)
  end,
  service_description = 'Multi %s',
  has_perfdata = true,
  multi_result = true,
}

check_info['example.multi_plain'] = {
  check_function = function(item, params, info)
    return {{0, 'ok'}, {1, 'meh', {{'x', 1}}}}
  end,
  service_description = 'Plain %s',
  multi_result = true,
}

check_info['example.lone'] = {
  check_function = function() return {{2, 'broken'}} end,
  service_description = 'Lone',
  multi_result = true,
}

check_info['example.empty'] = {
  check_function = function() return {} end,
  service_description = 'Empty',
  multi_result = true,
}

check_info['example.scalar'] = {
  check_function = function() return 42 end,
  service_description = 'Scalar',
  multi_result = true,
}

check_info['example.broken'] = {
  check_function = 'not a function',
}
"#;

    fn load_example(dir: &TempDir) -> CheckFile {
        let path = dir.path().join("example");
        fs::write(&path, EXAMPLE_CHECK).unwrap();
        CheckFile::load(&ScriptLoader::new(), "example", &path).unwrap()
    }

    #[test]
    fn test_inventory_end_to_end() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);
        let check = file.check("example").unwrap();

        assert_eq!(
            check.inventory("<<<example>>>\n1 2\n3 4").unwrap(),
            ScriptValue::List(vec![ScriptValue::Integer(2), ScriptValue::Integer(6)])
        );
    }

    #[test]
    fn test_raw_output_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);
        let check = file.check("example").unwrap();

        assert_eq!(
            check.inventory("\n\n<<<example>>>\n5\n\n").unwrap(),
            ScriptValue::List(vec![ScriptValue::Integer(10)])
        );
    }

    #[test]
    fn test_check_receives_item_and_params() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);
        let check = file.check("example").unwrap();
        let params = check.default_params("example_default_levels").unwrap();

        assert_eq!(
            check.check(Some("disk"), &params, "<<<example>>>\n1").unwrap(),
            ScriptValue::List(vec![ScriptValue::Integer(0), ScriptValue::from("item disk warn 80")])
        );
        assert_eq!(
            check.check(None, &CheckParams::None, "<<<example>>>").unwrap(),
            ScriptValue::List(vec![ScriptValue::Integer(0), ScriptValue::from("item nil warn nil")])
        );
    }

    const PARAMS_CHECK: &str = r#"
mixed_levels = { 80, 90, unit = 'percent' }
render_levels = { levels = { 80, 90 }, render = function(v) return v .. '%' end }

check_info['levels'] = {
  inventory_function = function(info)
    return { { 'mixed', 'mixed_levels' }, { 'render', 'render_levels' } }
  end,
  check_function = function(item, params, info)
    if item == 'mixed' then
      return { 0, tostring(params[1]) .. ' ' .. params.unit .. ' ' .. tostring(rawequal(params, mixed_levels)) }
    end
    return { 0, params.render(params.levels[2]) }
  end,
  service_description = 'Levels %s',
}
"#;

    #[test]
    fn test_default_params_reach_check_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("levels");
        fs::write(&path, PARAMS_CHECK).unwrap();
        let file = CheckFile::load(&ScriptLoader::new(), "levels", &path).unwrap();
        let check = file.check("levels").unwrap();

        let results = crate::validation::validate_inventory_and_check(&check, "<<<levels>>>").unwrap();

        let messages: Vec<&str> = results.iter().map(|(_, r)| r.message.as_str()).collect();
        assert_eq!(messages, vec!["80 percent true", "90%"]);
        assert_eq!(results[1].0.default_params.as_deref(), Some("render_levels"));
    }

    #[test]
    fn test_default_params_must_be_defined() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);
        let check = file.check("example").unwrap();

        assert_matches!(
            check.default_params("missing_levels"),
            Err(CheckError::Script(ScriptError::UnknownGlobal { .. }))
        );
        assert_matches!(
            check.check(None, &CheckParams::global("missing_levels"), "<<<example>>>"),
            Err(CheckError::Script(ScriptError::UnknownGlobal { .. }))
        );
    }

    #[test]
    fn test_lazy_multi_result_is_merged() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);
        let check = file.check("example.multi").unwrap();

        assert_eq!(
            check.check(Some("a"), &CheckParams::None, "<<<example>>>").unwrap(),
            ScriptValue::List(vec![
                ScriptValue::Integer(2),
                ScriptValue::from("ok, broken(!!)"),
                ScriptValue::List(vec![ScriptValue::from("perf-data")]),
            ])
        );
    }

    #[test]
    fn test_merged_perfdata_dropped_without_flag() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);
        let check = file.check("example.multi_plain").unwrap();

        assert!(!check.has_perfdata());
        assert_eq!(
            check.check(Some("a"), &CheckParams::None, "<<<example>>>").unwrap(),
            ScriptValue::List(vec![ScriptValue::Integer(1), ScriptValue::from("ok, meh(!!)")])
        );
    }

    #[test]
    fn test_single_partial_returned_unchanged() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);
        let check = file.check("example.lone").unwrap();

        assert_eq!(
            check.check(None, &CheckParams::None, "<<<example>>>").unwrap(),
            ScriptValue::List(vec![ScriptValue::Integer(2), ScriptValue::from("broken")])
        );
    }

    #[test]
    fn test_empty_multi_result_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);
        let check = file.check("example.empty").unwrap();

        assert_matches!(
            check.check(None, &CheckParams::None, "<<<example>>>"),
            Err(CheckError::EmptyMultiResult { .. })
        );
    }

    #[test]
    fn test_multi_result_must_be_list_or_iterator() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);
        let check = file.check("example.scalar").unwrap();

        assert_matches!(
            check.check(None, &CheckParams::None, "<<<example>>>"),
            Err(CheckError::UnexpectedReturn { found, .. }) if found == "integer"
        );
    }

    #[test]
    fn test_wrong_section_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);
        let check = file.check("example").unwrap();

        let error = check.inventory("<<<other>>>\n1").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Wrong section name in test data: expected \"example\", got \"other\""
        );
    }

    #[test]
    fn test_malformed_test_data_is_reported() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);
        let check = file.check("example").unwrap();

        assert_matches!(check.inventory("example\n1"), Err(CheckError::Section(_)));
    }

    #[test]
    fn test_lookup_failures() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);

        assert_matches!(file.check("example.nope"), Err(CheckError::UnknownCheck { .. }));
        assert_matches!(file.check("other.thing"), Err(CheckError::ForeignCheck { .. }));
    }

    #[test]
    fn test_registration_accessors() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);

        let check = file.check("example").unwrap();
        assert_eq!(check.section(), "example");
        assert!(!check.has_perfdata());
        assert_eq!(check.service_description().unwrap(), "Example");

        let multi = file.check("example.multi").unwrap();
        assert_eq!(multi.section(), "example");
        assert!(multi.has_perfdata());
        assert!(multi.is_multi_result());

        let broken = file.check("example.broken").unwrap();
        assert_matches!(
            broken.service_description(),
            Err(CheckError::MissingField { field: "service_description", .. })
        );
        assert_matches!(
            broken.check(None, &CheckParams::None, "<<<example>>>"),
            Err(CheckError::MalformedRegistration { .. })
        );
        assert_matches!(
            broken.inventory("<<<example>>>"),
            Err(CheckError::MissingField { field: "inventory_function", .. })
        );
    }

    #[test]
    fn test_check_names() {
        let dir = TempDir::new().unwrap();
        let file = load_example(&dir);

        assert_eq!(
            file.check_names().unwrap(),
            vec![
                "example",
                "example.broken",
                "example.empty",
                "example.lone",
                "example.multi",
                "example.multi_plain",
                "example.scalar",
            ]
        );
    }
}
