//! Structural validators
//!
//! Assert that what a check script returned has the shape the monitoring
//! core expects, and convert it into the typed [`crate::results`] form on
//! success. The validators only rely on [`CheckContract`] and
//! [`CheckRunner`], so they work on any check-like object.

mod error;

pub use error::ValidationError;

use crate::check::{CheckError, CheckParams};
use crate::config::constants::compile_time::check::MULTI_ITEM_PLACEHOLDER;
use crate::config::constants::compile_time::validation::{
    MAX_PERFDATA_FIELDS, MAX_STATUS, MIN_PERFDATA_FIELDS, MIN_STATUS, RESULT_LEN_PLAIN,
    RESULT_LEN_WITH_PERFDATA,
};
use crate::logging::codes;
use crate::results::{CheckResult, InventoryEntry, Number, PerfValue, PerfdataEntry, Status};
use crate::script::ScriptValue;
use crate::{log_error, log_success};

/// Declared metadata of a check
pub trait CheckContract {
    /// Dotted check name
    fn name(&self) -> &str;

    fn has_perfdata(&self) -> bool;

    /// Service description template, `None` when not declared
    fn service_description(&self) -> Option<String>;

    /// Whether the originating namespace defines `name`
    fn has_global(&self, name: &str) -> bool;
}

/// A check that can be driven with raw agent output
pub trait CheckRunner: CheckContract {
    fn inventory(&self, raw: &str) -> Result<ScriptValue, CheckError>;

    fn check(
        &self,
        item: Option<&str>,
        params: &CheckParams,
        raw: &str,
    ) -> Result<ScriptValue, CheckError>;

    /// Parameters referencing the namespace global named by an inventory entry
    fn default_params(&self, name: &str) -> Result<CheckParams, CheckError>;
}

/// Validate one check result against the check's perfdata declaration
pub fn validate_result<C>(check: &C, result: &ScriptValue) -> Result<CheckResult, ValidationError>
where
    C: CheckContract + ?Sized,
{
    let name = check.name();
    let fields = result
        .as_list()
        .ok_or_else(|| ValidationError::invalid_result(name, "result must be a list", result))?;

    let status = match fields.first() {
        Some(ScriptValue::Integer(code)) if (MIN_STATUS..=MAX_STATUS).contains(code) => {
            Status::from_code(*code)
        }
        _ => None,
    }
    .ok_or_else(|| {
        ValidationError::invalid_result(name, "status must be an integer from 0 to 3", result)
    })?;

    let message = fields
        .get(1)
        .and_then(ScriptValue::as_str)
        .ok_or_else(|| ValidationError::invalid_result(name, "message must be a string", result))?;

    let expected_len = if check.has_perfdata() {
        RESULT_LEN_WITH_PERFDATA
    } else {
        RESULT_LEN_PLAIN
    };
    if fields.len() != expected_len {
        return Err(ValidationError::invalid_result(
            name,
            format!(
                "expected {} elements (has_perfdata = {}), got {}",
                expected_len,
                check.has_perfdata(),
                fields.len()
            ),
            result,
        ));
    }

    let perfdata = match fields.get(2) {
        None => None,
        Some(ScriptValue::List(entries)) => Some(
            entries
                .iter()
                .map(validate_perfdata_entry)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(_) => {
            return Err(ValidationError::invalid_result(
                name,
                "perfdata must be a list",
                result,
            ))
        }
    };

    Ok(CheckResult {
        status,
        message: message.to_string(),
        perfdata,
    })
}

/// Validate one perfdata entry: label, value and up to four fields that
/// are numbers or the empty string
pub fn validate_perfdata_entry(entry: &ScriptValue) -> Result<PerfdataEntry, ValidationError> {
    let fields = entry
        .as_list()
        .ok_or_else(|| ValidationError::invalid_perfdata("entry must be a list", entry))?;

    if !(MIN_PERFDATA_FIELDS..=MAX_PERFDATA_FIELDS).contains(&fields.len()) {
        return Err(ValidationError::invalid_perfdata(
            format!(
                "expected {} to {} fields, got {}",
                MIN_PERFDATA_FIELDS,
                MAX_PERFDATA_FIELDS,
                fields.len()
            ),
            entry,
        ));
    }

    let label = fields[0]
        .as_str()
        .ok_or_else(|| ValidationError::invalid_perfdata("label must be a string", entry))?;

    let value = number(&fields[1])
        .ok_or_else(|| ValidationError::invalid_perfdata("value must be numeric", entry))?;

    let thresholds = fields[2..]
        .iter()
        .enumerate()
        .map(|(offset, field)| match field {
            ScriptValue::String(s) if s.is_empty() => Ok(PerfValue::Empty),
            other => number(other).map(PerfValue::Number).ok_or_else(|| {
                ValidationError::invalid_perfdata(
                    format!(
                        "field {} must be numeric or the empty string",
                        offset + MIN_PERFDATA_FIELDS + 1
                    ),
                    entry,
                )
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PerfdataEntry {
        label: label.to_string(),
        value,
        thresholds,
    })
}

fn number(value: &ScriptValue) -> Option<Number> {
    match value {
        ScriptValue::Integer(i) => Some(Number::Integer(*i)),
        ScriptValue::Float(f) => Some(Number::Float(*f)),
        _ => None,
    }
}

/// Validate an inventory against the check's service description
///
/// Without a `%s` placeholder at most one entry is allowed and no entry may
/// carry an item; with it every entry must carry one. Named default
/// parameters must exist in the check's namespace.
pub fn validate_inventory<C>(
    check: &C,
    inventory: &ScriptValue,
) -> Result<Vec<InventoryEntry>, ValidationError>
where
    C: CheckContract + ?Sized,
{
    let name = check.name();
    let description = check
        .service_description()
        .ok_or_else(|| ValidationError::MissingServiceDescription {
            check: name.to_string(),
        })?;
    let multi_item = description.contains(MULTI_ITEM_PLACEHOLDER);

    let entries = inventory.as_list().ok_or_else(|| {
        ValidationError::invalid_inventory(name, "inventory must be a list", inventory)
    })?;

    if !multi_item && entries.len() > 1 {
        return Err(ValidationError::invalid_inventory(
            name,
            format!(
                "service description '{}' has no '{}', so at most one entry is allowed",
                description, MULTI_ITEM_PLACEHOLDER
            ),
            inventory,
        ));
    }

    entries
        .iter()
        .map(|entry| inventory_entry(check, entry, multi_item))
        .collect()
}

fn inventory_entry<C>(
    check: &C,
    entry: &ScriptValue,
    multi_item: bool,
) -> Result<InventoryEntry, ValidationError>
where
    C: CheckContract + ?Sized,
{
    let name = check.name();
    let invalid = |message: &str| ValidationError::invalid_inventory(name, message, entry);

    // Trailing nils vanish from Lua tables, so {} and {item} are pairs too
    let fields = entry
        .as_list()
        .filter(|fields| fields.len() <= 2)
        .ok_or_else(|| invalid("entry must be an {item, default_params} pair"))?;

    let item = match fields.first() {
        None | Some(ScriptValue::Nil) => None,
        Some(ScriptValue::String(item)) => Some(item.clone()),
        Some(_) => return Err(invalid("item must be a string or nil")),
    };

    if item.is_some() != multi_item {
        return Err(invalid(if multi_item {
            "multi-item check requires an item"
        } else {
            "single-item check must not carry an item"
        }));
    }

    let default_params = match fields.get(1) {
        None | Some(ScriptValue::Nil) => None,
        Some(ScriptValue::String(params)) => {
            if !check.has_global(params) {
                return Err(invalid(&format!(
                    "default parameters '{}' are not defined",
                    params
                )));
            }
            Some(params.clone())
        }
        Some(_) => return Err(invalid("default parameters must be a name or nil")),
    };

    Ok(InventoryEntry {
        item,
        default_params,
    })
}

/// Inventory `raw`, then check every discovered item with its default
/// parameters; stops at the first failure
pub fn validate_inventory_and_check<C>(
    check: &C,
    raw: &str,
) -> Result<Vec<(InventoryEntry, CheckResult)>, ValidationError>
where
    C: CheckRunner + ?Sized,
{
    let outcome = run_inventory_and_check(check, raw);
    match &outcome {
        Ok(results) => log_success!(codes::success::VALIDATION_PASSED, "Inventory and check are well formed",
            "check" => check.name(),
            "items" => results.len()),
        Err(e) => log_error!(e.error_code(), "Inventory and check validation failed",
            "check" => check.name(),
            "error" => e),
    }
    outcome
}

fn run_inventory_and_check<C>(
    check: &C,
    raw: &str,
) -> Result<Vec<(InventoryEntry, CheckResult)>, ValidationError>
where
    C: CheckRunner + ?Sized,
{
    let inventory = check.inventory(raw)?;
    let entries = validate_inventory(check, &inventory)?;

    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        let params = match entry.default_params.as_deref() {
            Some(name) if !name.is_empty() => check.default_params(name)?,
            _ => CheckParams::None,
        };
        let raw_result = check.check(entry.item.as_deref(), &params, raw)?;
        let result = validate_result(check, &raw_result)?;
        results.push((entry, result));
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct FakeCheck {
        has_perfdata: bool,
        service_description: Option<String>,
        globals: BTreeMap<String, ScriptValue>,
        inventory: ScriptValue,
        result: ScriptValue,
        calls: RefCell<Vec<(Option<String>, CheckParams, String)>>,
    }

    impl FakeCheck {
        fn with_description(description: &str) -> Self {
            Self {
                service_description: Some(description.to_string()),
                ..Default::default()
            }
        }

        fn with_perfdata(has_perfdata: bool) -> Self {
            Self {
                has_perfdata,
                service_description: Some("Sample check".to_string()),
                ..Default::default()
            }
        }
    }

    impl CheckContract for FakeCheck {
        fn name(&self) -> &str {
            "fake"
        }

        fn has_perfdata(&self) -> bool {
            self.has_perfdata
        }

        fn service_description(&self) -> Option<String> {
            self.service_description.clone()
        }

        fn has_global(&self, name: &str) -> bool {
            self.globals.contains_key(name)
        }
    }

    impl CheckRunner for FakeCheck {
        fn inventory(&self, _raw: &str) -> Result<ScriptValue, CheckError> {
            Ok(self.inventory.clone())
        }

        fn check(
            &self,
            item: Option<&str>,
            params: &CheckParams,
            raw: &str,
        ) -> Result<ScriptValue, CheckError> {
            self.calls.borrow_mut().push((
                item.map(str::to_string),
                params.clone(),
                raw.to_string(),
            ));
            Ok(self.result.clone())
        }

        fn default_params(&self, name: &str) -> Result<CheckParams, CheckError> {
            Ok(CheckParams::global(name))
        }
    }

    fn list(items: Vec<ScriptValue>) -> ScriptValue {
        ScriptValue::List(items)
    }

    fn int(i: i64) -> ScriptValue {
        ScriptValue::Integer(i)
    }

    fn s(text: &str) -> ScriptValue {
        ScriptValue::from(text)
    }

    fn pair(item: Option<&str>, params: Option<&str>) -> ScriptValue {
        list(vec![ScriptValue::from(item), ScriptValue::from(params)])
    }

    #[test]
    fn test_inventory_and_check_drive_every_item() {
        let mut check = FakeCheck::with_description("Sample %s");
        check.inventory = list(vec![
            pair(Some("one more thing"), None),
            pair(Some("other"), Some("default_params")),
        ]);
        check.result = list(vec![int(0), s("OK")]);
        check.globals.insert("default_params".to_string(), int(42));

        let results = validate_inventory_and_check(&check, "<<<arr>>>").unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.status == Status::Ok));
        assert_eq!(
            *check.calls.borrow(),
            vec![
                (Some("one more thing".to_string()), CheckParams::None, "<<<arr>>>".to_string()),
                (
                    Some("other".to_string()),
                    CheckParams::global("default_params"),
                    "<<<arr>>>".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_inventory_and_check_stops_at_first_failure() {
        let mut check = FakeCheck::with_description("Sample %s");
        check.inventory = list(vec![pair(Some("a"), None), pair(Some("b"), None)]);
        check.result = list(vec![int(7), s("bad")]);

        assert_matches!(
            validate_inventory_and_check(&check, "<<<arr>>>"),
            Err(ValidationError::InvalidResult { .. })
        );
        assert_eq!(check.calls.borrow().len(), 1);
    }

    #[test]
    fn test_inventory_and_check_rejects_bad_inventory_before_checking() {
        let mut check = FakeCheck::with_description("Sample");
        check.inventory = list(vec![pair(Some("item"), None)]);

        assert_matches!(
            validate_inventory_and_check(&check, "<<<arr>>>"),
            Err(ValidationError::InvalidInventory { .. })
        );
        assert!(check.calls.borrow().is_empty());
    }

    #[test]
    fn test_well_formed_results() {
        let cases = [
            (false, list(vec![int(0), s("Everything fine")])),
            (false, list(vec![int(1), s("Not so good anymore")])),
            (false, list(vec![int(2), s("AAAAAAAARRRRGGGH")])),
            (false, list(vec![int(3), s("WTF?")])),
            (true, list(vec![int(0), s("OK"), list(vec![list(vec![s("foo"), int(1)])])])),
            (
                true,
                list(vec![
                    int(0),
                    s("OK"),
                    list(vec![
                        list(vec![s("foo"), int(1)]),
                        list(vec![s("bar"), ScriptValue::Float(5.0)]),
                    ]),
                ]),
            ),
        ];

        for (has_perfdata, result) in cases {
            let check = FakeCheck::with_perfdata(has_perfdata);
            if let Err(e) = validate_result(&check, &result) {
                panic!("{} should be valid: {}", result, e);
            }
        }
    }

    #[test]
    fn test_validated_result_is_typed() {
        let check = FakeCheck::with_perfdata(true);
        let result = validate_result(
            &check,
            &list(vec![int(1), s("warn"), list(vec![list(vec![s("load"), int(3), int(2)])])]),
        )
        .unwrap();

        assert_eq!(result.status, Status::Warning);
        assert_eq!(result.message, "warn");
        assert_eq!(result.perfdata()[0].warn(), Some(Number::Integer(2)));
    }

    #[test]
    fn test_malformed_results() {
        let cases = [
            (false, list(vec![int(-1), s("Foo")])),
            (false, list(vec![int(4), s("Foo")])),
            (false, list(vec![s("foo"), s("Foo")])),
            (false, list(vec![ScriptValue::Boolean(true), s("Foo")])),
            (false, list(vec![ScriptValue::Float(0.0), s("Foo")])),
            (false, list(vec![int(0), int(1)])),
            (false, list(vec![int(0), s("Foo"), list(vec![])])),
            (true, list(vec![int(0), s("Foo")])),
            (true, list(vec![int(0), s("Foo"), s("data")])),
            (true, list(vec![int(0), s("Foo"), list(vec![list(vec![s("foo"), s("broken")])])])),
            (false, s("not a list")),
            (false, list(vec![])),
        ];

        for (has_perfdata, result) in cases {
            let check = FakeCheck::with_perfdata(has_perfdata);
            assert!(
                validate_result(&check, &result).is_err(),
                "{} should be rejected",
                result
            );
        }
    }

    #[test]
    fn test_well_formed_inventories() {
        let mut cases = vec![
            ("Sample check", list(vec![pair(None, None)])),
            ("Sample check", list(vec![pair(None, Some("sample_default_params"))])),
            ("Sample check", list(vec![])),
            ("Sample check for %s", list(vec![])),
            ("Sample check for %s", list(vec![pair(Some("foo"), None)])),
        ];
        // {nil, nil} and {'foo'} lose their trailing nils in Lua
        cases.push(("Sample check", list(vec![list(vec![])])));
        cases.push(("Sample check for %s", list(vec![list(vec![s("foo")])])));

        for (description, inventory) in cases {
            let mut check = FakeCheck::with_description(description);
            check
                .globals
                .insert("sample_default_params".to_string(), int(1));
            if let Err(e) = validate_inventory(&check, &inventory) {
                panic!("{} for '{}' should be valid: {}", inventory, description, e);
            }
        }
    }

    #[test]
    fn test_malformed_inventories() {
        let cases = [
            ("Sample check", list(vec![pair(None, None), pair(None, None)])),
            ("Sample check", list(vec![pair(Some("item"), None)])),
            ("Sample check", list(vec![pair(None, Some("non_existing_default_params"))])),
            ("Sample check for %s", list(vec![pair(None, None)])),
            ("Sample check for %s", list(vec![list(vec![int(1), ScriptValue::Nil])])),
            ("Sample check for %s", list(vec![list(vec![s("a"), ScriptValue::Nil, s("x")])])),
            ("Sample check", s("not a list")),
        ];

        for (description, inventory) in cases {
            let check = FakeCheck::with_description(description);
            assert_matches!(
                validate_inventory(&check, &inventory),
                Err(ValidationError::InvalidInventory { .. }),
                "{} for '{}' should be rejected",
                inventory,
                description
            );
        }
    }

    #[test]
    fn test_inventory_requires_service_description() {
        let check = FakeCheck::default();
        assert_matches!(
            validate_inventory(&check, &list(vec![])),
            Err(ValidationError::MissingServiceDescription { .. })
        );
    }

    #[test]
    fn test_validated_inventory_is_typed() {
        let mut check = FakeCheck::with_description("Disk %s");
        check.globals.insert("disk_levels".to_string(), int(1));
        let entries =
            validate_inventory(&check, &list(vec![pair(Some("/var"), Some("disk_levels"))]))
                .unwrap();

        assert_eq!(
            entries,
            vec![InventoryEntry {
                item: Some("/var".to_string()),
                default_params: Some("disk_levels".to_string()),
            }]
        );
    }

    #[test]
    fn test_well_formed_perfdata_entries() {
        let f = ScriptValue::Float;
        let cases = [
            vec![s("foo"), int(1)],
            vec![s("foo"), int(1), int(2)],
            vec![s("foo"), int(1), int(2), int(3)],
            vec![s("foo"), int(1), int(2), int(3), int(4)],
            vec![s("foo"), int(1), int(2), int(3), int(4), int(5)],
            vec![s("foo"), f(0.1)],
            vec![s("foo"), f(0.1), f(0.2)],
            vec![s("foo"), f(0.1), f(0.2), f(0.3)],
            vec![s("foo"), f(0.1), f(0.2), f(0.3), f(0.4)],
            vec![s("foo"), f(0.1), f(0.2), f(0.3), f(0.4), f(0.5)],
            vec![s("foo"), int(1), s(""), int(3)],
            vec![s("foo"), int(1), int(2), s(""), int(4)],
            vec![s("foo"), int(1), int(2), int(3), s(""), int(5)],
        ];

        for entry in cases {
            let entry = list(entry);
            if let Err(e) = validate_perfdata_entry(&entry) {
                panic!("{} should be valid: {}", entry, e);
            }
        }
    }

    #[test]
    fn test_malformed_perfdata_entries() {
        let cases = [
            vec![s("foo")],
            vec![s("foo"), int(1), int(2), int(3), int(4), int(5), int(6)],
            vec![int(1), int(1)],
            vec![s("foo"), s("foo")],
            vec![s("foo"), int(1), s("foo")],
            vec![s("foo"), int(1), int(2), s("foo")],
            vec![s("foo"), int(1), int(2), int(3), s("foo")],
            vec![s("foo"), int(1), int(2), int(3), int(4), s("foo")],
            vec![s("foo"), int(1), int(2), int(3), int(4), int(5), s("foo")],
            vec![s("foo"), ScriptValue::Boolean(true)],
            vec![s("foo"), int(1), ScriptValue::Nil, int(3)],
        ];

        for entry in cases {
            let entry = list(entry);
            assert_matches!(
                validate_perfdata_entry(&entry),
                Err(ValidationError::InvalidPerfdata { .. }),
                "{} should be rejected",
                entry
            );
        }
    }
}
