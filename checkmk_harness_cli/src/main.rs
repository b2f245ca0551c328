//! # Check Harness CLI
//!
//! Runs check plugins against recorded agent output from the command line.

mod report;

use checkmk_harness::config::build_info;
use checkmk_harness::logging::codes;
use checkmk_harness::prelude::*;
use checkmk_harness::{log_error, log_info, log_success};
use chrono::Utc;
use clap::{Parser, Subcommand};
use report::ValidationReport;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[clap(name = "checkmk-harness", version, about = "Test harness for Check_MK check plugins")]
struct App {
    /// TOML file with harness preferences
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    /// Directory check files are loaded from
    #[clap(long, global = true)]
    checks_dir: Option<PathBuf>,
    /// Directory agent executables are resolved against
    #[clap(long, global = true)]
    agents_dir: Option<PathBuf>,
    /// Raise log verbosity (repeatable)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the inventory of a check as JSON
    Inventory {
        /// Dotted check name, e.g. `df` or `df.mounts`
        check: String,
        /// File with agent output for the check's section
        data_file: PathBuf,
    },
    /// Print the result of a check as JSON and plugin output
    Check {
        check: String,
        data_file: PathBuf,
        /// Item to check
        #[clap(long)]
        item: Option<String>,
        /// Name of the global holding the check parameters
        #[clap(long)]
        params: Option<String>,
    },
    /// Run inventory and check for every discovered item and validate both
    Validate { check: String, data_file: PathBuf },
    /// List the checks registered by a check file
    List { name: String },
    /// Run an agent executable and print its output
    Agent {
        /// Path below the agents directory, e.g. `plugins/example`
        relpath: PathBuf,
        #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> ExitCode {
    let app = App::parse();

    let preferences = match load_preferences(&app) {
        Ok(preferences) => preferences,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    env_logger::Builder::new()
        .filter_level(preferences.log_level.raised_by(app.verbose).to_level_filter())
        .parse_default_env()
        .init();

    log_info!("Check harness starting",
        "version" => build_info::version(),
        "checks_dir" => preferences.checks_dir.display(),
        "agents_dir" => preferences.agents_dir.display());

    let harness = Harness::new(preferences);
    match run(&harness, app.command) {
        Ok(code) => code,
        Err(e) => {
            log_error!(e.error_code(), "Command failed",
                "kind" => e.kind(),
                "error" => &e);
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn load_preferences(app: &App) -> Result<HarnessPreferences, ConfigError> {
    let mut preferences = match &app.config {
        Some(path) => HarnessPreferences::from_toml_file(path)?,
        None => HarnessPreferences::default(),
    };
    if let Some(dir) = &app.checks_dir {
        preferences = preferences.with_checks_dir(dir);
    }
    if let Some(dir) = &app.agents_dir {
        preferences = preferences.with_agents_dir(dir);
    }
    preferences.validate()?;
    Ok(preferences)
}

fn run(harness: &Harness, command: Command) -> Result<ExitCode, HarnessError> {
    match command {
        Command::Inventory { check, data_file } => {
            let checks = harness.checks(Some(file_name(&check)))?;
            let check = checks.check(&check)?;
            let inventory = check.inventory(&read_data(&data_file)?)?;
            let entries = validate_inventory(&check, &inventory)?;
            print_json(&entries);
            Ok(ExitCode::SUCCESS)
        }
        Command::Check {
            check,
            data_file,
            item,
            params,
        } => {
            let checks = harness.checks(Some(file_name(&check)))?;
            let check = checks.check(&check)?;
            let params = match params {
                Some(name) => CheckRunner::default_params(&check, &name)?,
                None => CheckParams::None,
            };
            let raw = check.check(item.as_deref(), &params, &read_data(&data_file)?)?;
            let result = validate_result(&check, &raw)?;
            print_json(&result);
            println!("{}: {}", result.status, result);
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { check, data_file } => {
            let started_at = Utc::now();
            let outcome = validate(harness, &check, &data_file);
            let report = ValidationReport::new(&check, &data_file, started_at, outcome);
            match report.to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error: cannot render report: {}", e),
            }
            if report.passed {
                log_success!(codes::success::VALIDATION_PASSED, "Validation passed",
                    "check" => &check,
                    "services" => report.services.len());
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::List { name } => {
            for check in harness.checks(Some(&name))?.check_names()? {
                println!("{}", check);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Agent { relpath, args } => {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let output = harness.agents().agent(&relpath)?.run(&args)?;
            print!("{}", output.stdout);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn validate(
    harness: &Harness,
    name: &str,
    data_file: &Path,
) -> Result<(String, Vec<(InventoryEntry, CheckResult)>), HarnessError> {
    let checks = harness.checks(Some(file_name(name)))?;
    let check = checks.check(name)?;
    let pairs = validate_inventory_and_check(&check, &read_data(data_file)?)?;
    Ok((check.service_description()?, pairs))
}

/// Check file a dotted check name lives in
fn file_name(check: &str) -> &str {
    check.split('.').next().unwrap_or(check)
}

fn read_data(path: &Path) -> Result<String, HarnessError> {
    std::fs::read_to_string(path).map_err(|e| {
        let error = if path.is_file() {
            ScriptError::io(path, &e)
        } else {
            ScriptError::missing_file(path)
        };
        HarnessError::from(error)
    })
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: cannot render JSON: {}", e),
    }
}
