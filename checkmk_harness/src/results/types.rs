//! # Check Result Types
//!
//! Typed forms of what check scripts return. Values of these types only
//! exist once the raw script value passed structural validation, so a
//! `CheckResult` always carries a status in range and well-formed perfdata.

use serde::Serialize;
use std::fmt;

/// Monitoring state of a check result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum Status {
    Ok = 0,
    Warning = 1,
    Critical = 2,
    Unknown = 3,
}

impl Status {
    /// Status for a numeric state, `None` outside 0..=3
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Status::Ok),
            1 => Some(Status::Warning),
            2 => Some(Status::Critical),
            3 => Some(Status::Unknown),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Warning => "WARN",
            Status::Critical => "CRIT",
            Status::Unknown => "UNKNOWN",
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Numeric perfdata field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{}", fl),
        }
    }
}

/// Optional trailing perfdata field: a number or the empty string
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerfValue {
    Number(Number),
    Empty,
}

impl Serialize for PerfValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PerfValue::Number(n) => n.serialize(serializer),
            PerfValue::Empty => serializer.serialize_str(""),
        }
    }
}

impl PerfValue {
    pub fn number(self) -> Option<Number> {
        match self {
            PerfValue::Number(n) => Some(n),
            PerfValue::Empty => None,
        }
    }
}

impl fmt::Display for PerfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerfValue::Number(n) => write!(f, "{}", n),
            PerfValue::Empty => Ok(()),
        }
    }
}

/// One performance metric: label, value and up to four optional fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerfdataEntry {
    pub label: String,
    pub value: Number,
    /// warn, crit, min, max in that order; shorter when the script left
    /// trailing fields out
    pub thresholds: Vec<PerfValue>,
}

impl PerfdataEntry {
    fn threshold(&self, index: usize) -> Option<Number> {
        self.thresholds.get(index).and_then(|v| v.number())
    }

    pub fn warn(&self) -> Option<Number> {
        self.threshold(0)
    }

    pub fn crit(&self) -> Option<Number> {
        self.threshold(1)
    }

    pub fn min(&self) -> Option<Number> {
        self.threshold(2)
    }

    pub fn max(&self) -> Option<Number> {
        self.threshold(3)
    }
}

impl fmt::Display for PerfdataEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.contains(char::is_whitespace) {
            write!(f, "'{}'={}", self.label, self.value)?;
        } else {
            write!(f, "{}={}", self.label, self.value)?;
        }
        for field in &self.thresholds {
            write!(f, ";{}", field)?;
        }
        Ok(())
    }
}

/// Validated check result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub status: Status,
    pub message: String,
    /// Present exactly when the check declares perfdata support
    pub perfdata: Option<Vec<PerfdataEntry>>,
}

impl CheckResult {
    pub fn perfdata(&self) -> &[PerfdataEntry] {
        self.perfdata.as_deref().unwrap_or_default()
    }
}

/// Renders as plugin output: `message | label=value;warn;crit;min;max ...`
impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        let perfdata = self.perfdata();
        if !perfdata.is_empty() {
            write!(f, " |")?;
            for entry in perfdata {
                write!(f, " {}", entry)?;
            }
        }
        Ok(())
    }
}

/// Validated inventory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryEntry {
    /// Monitored instance; absent for singleton checks
    pub item: Option<String>,
    /// Name of the namespace global holding default parameters
    pub default_params: Option<String>,
}

impl InventoryEntry {
    /// Service name produced by substituting the item into `template`
    pub fn service_name(&self, template: &str, placeholder: &str) -> String {
        match &self.item {
            Some(item) => template.replacen(placeholder, item, 1),
            None => template.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_and_order() {
        assert_eq!(Status::from_code(2), Some(Status::Critical));
        assert_eq!(Status::from_code(4), None);
        assert_eq!(Status::from_code(-1), None);
        assert!(Status::Unknown > Status::Critical);
        assert_eq!(Status::Warning.to_string(), "WARN");
        assert_eq!(serde_json::to_string(&Status::Critical).unwrap(), "2");
    }

    #[test]
    fn test_perfdata_accessors() {
        let entry = PerfdataEntry {
            label: "load1".to_string(),
            value: Number::Float(0.5),
            thresholds: vec![
                PerfValue::Number(Number::Integer(5)),
                PerfValue::Empty,
                PerfValue::Number(Number::Integer(0)),
            ],
        };
        assert_eq!(entry.warn(), Some(Number::Integer(5)));
        assert_eq!(entry.crit(), None);
        assert_eq!(entry.min(), Some(Number::Integer(0)));
        assert_eq!(entry.max(), None);
        assert_eq!(entry.to_string(), "load1=0.5;5;;0");
    }

    #[test]
    fn test_check_result_plugin_output() {
        let result = CheckResult {
            status: Status::Ok,
            message: "fine".to_string(),
            perfdata: Some(vec![
                PerfdataEntry {
                    label: "used space".to_string(),
                    value: Number::Integer(10),
                    thresholds: vec![],
                },
                PerfdataEntry {
                    label: "free".to_string(),
                    value: Number::Integer(90),
                    thresholds: vec![PerfValue::Number(Number::Integer(20))],
                },
            ]),
        };
        assert_eq!(result.to_string(), "fine | 'used space'=10 free=90;20");

        let plain = CheckResult {
            status: Status::Critical,
            message: "broken".to_string(),
            perfdata: None,
        };
        assert_eq!(plain.to_string(), "broken");
        assert!(plain.perfdata().is_empty());
    }

    #[test]
    fn test_perfdata_serializes_empty_fields_as_strings() {
        let entry = PerfdataEntry {
            label: "x".to_string(),
            value: Number::Integer(1),
            thresholds: vec![PerfValue::Empty, PerfValue::Number(Number::Float(2.5))],
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            serde_json::json!({"label": "x", "value": 1, "thresholds": ["", 2.5]})
        );
    }

    #[test]
    fn test_service_name() {
        let entry = InventoryEntry {
            item: Some("/var".to_string()),
            default_params: None,
        };
        assert_eq!(entry.service_name("fs_%s", "%s"), "fs_/var");

        let single = InventoryEntry {
            item: None,
            default_params: None,
        };
        assert_eq!(single.service_name("Uptime", "%s"), "Uptime");
    }
}
