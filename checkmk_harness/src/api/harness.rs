//! # Check Harness
//!
//! Entry point for test code: resolves check files and agent plugins by the
//! name of the check under test.

use super::errors::HarnessError;
use crate::agent::{Agent, AgentDirectory};
use crate::check::CheckFile;
use crate::config::HarnessPreferences;
use crate::log_info;
use crate::script::ScriptLoader;

/// Check-file and agent lookup rooted at the configured directories
#[derive(Debug, Clone)]
pub struct Harness {
    preferences: HarnessPreferences,
    loader: ScriptLoader,
}

impl Harness {
    pub fn new(preferences: HarnessPreferences) -> Self {
        Self {
            preferences,
            loader: ScriptLoader::new(),
        }
    }

    /// Harness configured from environment variables and defaults
    pub fn from_env() -> Result<Self, HarnessError> {
        let preferences = HarnessPreferences::default();
        preferences.validate()?;
        Ok(Self::new(preferences))
    }

    pub fn with_loader(mut self, loader: ScriptLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn preferences(&self) -> &HarnessPreferences {
        &self.preferences
    }

    fn require(test_for: Option<&str>) -> Result<&str, HarnessError> {
        test_for
            .filter(|name| !name.is_empty())
            .ok_or(HarnessError::MissingTestFor)
    }

    /// Load the check file for the check under test
    ///
    /// The file is re-read on every call.
    pub fn checks(&self, test_for: Option<&str>) -> Result<CheckFile, HarnessError> {
        let name = Self::require(test_for)?;
        let path = self.preferences.checks_dir.join(name);
        log_info!("Loading check file", "check" => name, "path" => path.display());
        Ok(CheckFile::load(&self.loader, name, &path)?)
    }

    /// Agent directory rooted at the configured agents directory
    pub fn agents(&self) -> AgentDirectory {
        AgentDirectory::new(
            self.preferences.agents_dir.clone(),
            self.preferences.agent_timeout(),
        )
    }

    /// Agent plugin of the check under test
    pub fn agent(&self, test_for: Option<&str>) -> Result<Agent, HarnessError> {
        let name = Self::require(test_for)?;
        Ok(self.agents().plugin(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;
    use crate::script::ScriptValue;
    use std::fs;
    use tempfile::TempDir;

    fn harness(dir: &TempDir) -> Harness {
        Harness::new(
            HarnessPreferences::default()
                .with_checks_dir(dir.path().join("checks"))
                .with_agents_dir(dir.path().join("agents")),
        )
    }

    #[test]
    fn test_checks_requires_test_for() {
        let dir = TempDir::new().unwrap();
        let error = harness(&dir).checks(None).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Usage);
        assert!(error.to_string().starts_with("Please specify the check to test"));

        assert_eq!(
            harness(&dir).agent(Some("")).unwrap_err(),
            HarnessError::MissingTestFor
        );
    }

    #[test]
    fn test_checks_missing_file() {
        let dir = TempDir::new().unwrap();
        let error = harness(&dir).checks(Some("example")).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::MissingResource);
        assert_eq!(
            error.missing_path(),
            Some(dir.path().join("checks").join("example").as_path())
        );
    }

    #[test]
    fn test_checks_end_to_end() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("checks")).unwrap();
        fs::write(
            dir.path().join("checks").join("example"),
            r#"
check_info['example'] = {
  inventory_function = function(info)
    local inventory = {}
    for _, row in ipairs(info) do
      table.insert(inventory, tonumber(row[1]) * 2)
    end
    return inventory
  end,
  service_description = 'Example',
}
"#,
        )
        .unwrap();

        let checks = harness(&dir).checks(Some("example")).unwrap();
        assert_eq!(checks.name(), "example");
        assert_eq!(
            checks
                .check("example")
                .unwrap()
                .inventory("<<<example>>>\n1 2\n3 4")
                .unwrap(),
            ScriptValue::List(vec![ScriptValue::Integer(2), ScriptValue::Integer(6)])
        );
    }

    #[test]
    fn test_agent_missing_plugin_names_path() {
        let dir = TempDir::new().unwrap();
        let error = harness(&dir).agent(Some("example")).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::MissingResource);
        assert!(error
            .to_string()
            .contains("agents/plugins/example\" does not exist"));
    }
}
