//! Config command - View and validate HRFlow configuration
//!
//! Provides the `hrflow config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports every error found

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use hrflow_core::config::{Config, ValidationError};

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
}

impl ConfigCommand {
    pub fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(config_path, format),
            ConfigCommand::Validate => execute_validate(config_path, format),
        }
    }
}

fn execute_show(config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let config = Config::load_or_default(config_path);

    info!(config_path = %config_path.display(), "Showing configuration");

    if format.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
        return Ok(());
    }

    let source = if config_path.exists() {
        config_path.display().to_string()
    } else {
        "built-in defaults".to_string()
    };
    formatter.success(&format!("Configuration ({source})"));
    formatter.info("");

    let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
    for line in yaml.lines() {
        formatter.info(line);
    }

    Ok(())
}

fn execute_validate(config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);

    info!(config_path = %config_path.display(), "Validating configuration");

    match check_config_file(config_path) {
        Ok(ConfigCheck { source, errors }) => {
            if source == ConfigSource::Defaults {
                formatter.warn(&format!(
                    "Configuration file not found: {}",
                    config_path.display()
                ));
            }
            report_validation(formatter.as_ref(), format, config_path, source, &errors);
        }
        Err(message) => {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "source": ConfigSource::File.as_str(),
                    "errors": [message],
                }));
            } else {
                formatter.error(&message);
                formatter.info(&format!("File: {}", config_path.display()));
            }
        }
    }
    Ok(())
}

/// Where the validated configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigSource {
    File,
    Defaults,
}

impl ConfigSource {
    fn as_str(self) -> &'static str {
        match self {
            ConfigSource::File => "file",
            ConfigSource::Defaults => "built-in defaults",
        }
    }
}

#[derive(Debug)]
struct ConfigCheck {
    source: ConfigSource,
    errors: Vec<ValidationError>,
}

/// Validates the file at `config_path`, or the defaults if there is none
///
/// Returns `Err` with a message when the file exists but cannot be parsed.
fn check_config_file(config_path: &Path) -> std::result::Result<ConfigCheck, String> {
    if !config_path.exists() {
        return Ok(ConfigCheck {
            source: ConfigSource::Defaults,
            errors: Config::default().validate(),
        });
    }
    let config =
        Config::load(config_path).map_err(|e| format!("Failed to parse configuration: {e}"))?;
    Ok(ConfigCheck {
        source: ConfigSource::File,
        errors: config.validate(),
    })
}

fn report_validation(
    formatter: &dyn OutputFormatter,
    format: OutputFormat,
    config_path: &Path,
    source: ConfigSource,
    errors: &[ValidationError],
) {
    if format.is_json() {
        let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "source": source.as_str(),
            "errors": error_strings,
        }));
        return;
    }

    let origin = match source {
        ConfigSource::File => format!("File: {}", config_path.display()),
        ConfigSource::Defaults => "Source: built-in defaults".to_string(),
    };
    if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&origin);
    } else {
        formatter.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        formatter.info(&origin);
        formatter.info("");
        for error in errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }
}
