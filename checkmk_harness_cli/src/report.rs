//! JSON report written by `checkmk-harness validate`

use checkmk_harness::config::constants::compile_time::check::MULTI_ITEM_PLACEHOLDER;
use checkmk_harness::logging::codes;
use checkmk_harness::results::{CheckResult, InventoryEntry};
use checkmk_harness::HarnessError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub check: String,
    pub data_file: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub passed: bool,
    pub services: Vec<ServiceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Serialize)]
pub struct ServiceReport {
    pub service: String,
    pub item: Option<String>,
    pub default_params: Option<String>,
    pub result: CheckResult,
    pub output: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub kind: String,
    pub code: String,
    pub category: String,
    pub message: String,
}

impl From<&HarnessError> for ErrorReport {
    fn from(error: &HarnessError) -> Self {
        let code = error.error_code();
        Self {
            kind: error.kind().to_string(),
            code: code.to_string(),
            category: codes::get_category(code.as_str()).to_string(),
            message: error.to_string(),
        }
    }
}

impl ValidationReport {
    pub fn new(
        check: &str,
        data_file: &Path,
        started_at: DateTime<Utc>,
        outcome: Result<(String, Vec<(InventoryEntry, CheckResult)>), HarnessError>,
    ) -> Self {
        let finished_at = Utc::now();
        let (services, error) = match outcome {
            Ok((description, pairs)) => (
                pairs
                    .into_iter()
                    .map(|(entry, result)| ServiceReport {
                        service: entry.service_name(&description, MULTI_ITEM_PLACEHOLDER),
                        output: result.to_string(),
                        item: entry.item,
                        default_params: entry.default_params,
                        result,
                    })
                    .collect(),
                None,
            ),
            Err(error) => (Vec::new(), Some(ErrorReport::from(&error))),
        };

        Self {
            check: check.to_string(),
            data_file: data_file.display().to_string(),
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
            passed: error.is_none(),
            services,
            error,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
