//! Statuses command - List the configured status catalogs
//!
//! Provides the `hrflow statuses` CLI command which prints, for each entity
//! kind, every status with its per-role transition targets.

use anyhow::Result;
use clap::Args;
use tracing::info;

use hrflow_core::config::Config;
use hrflow_core::domain::{EntityKind, Status};
use hrflow_policy::StatusTransitionPolicy;

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusesCommand {
    /// Only show this entity kind (user_timesheet, user_work_schedule)
    #[arg(long)]
    pub kind: Option<EntityKind>,
}

impl StatusesCommand {
    pub fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let registry = super::load_policies(config)?;

        let kinds: Vec<EntityKind> = match self.kind {
            Some(kind) => vec![kind],
            None => registry.kinds().collect(),
        };
        info!(kinds = kinds.len(), "Listing status catalogs");

        if format.is_json() {
            let mut catalogs = serde_json::Map::new();
            for kind in &kinds {
                let statuses: Vec<serde_json::Value> = match registry.policy(*kind) {
                    Ok(policy) => policy.statuses().map(status_json).collect(),
                    Err(_) => Vec::new(),
                };
                catalogs.insert(kind.to_string(), serde_json::Value::Array(statuses));
            }
            formatter.print_json(&serde_json::Value::Object(catalogs));
            return Ok(());
        }

        for kind in kinds {
            match registry.policy(kind) {
                Ok(policy) => print_catalog(formatter.as_ref(), policy),
                Err(e) => formatter.warn(&e.to_string()),
            }
        }

        Ok(())
    }
}

fn status_json(status: &Status) -> serde_json::Value {
    let rules: serde_json::Map<String, serde_json::Value> = status
        .rules()
        .iter()
        .map(|(role, targets)| {
            let targets: Vec<&str> = targets.iter().map(|t| t.as_str()).collect();
            (role.to_string(), serde_json::json!(targets))
        })
        .collect();
    serde_json::json!({
        "id": status.id().as_str(),
        "title": status.title(),
        "terminal": status.is_terminal(),
        "rules": rules,
    })
}

fn print_catalog(formatter: &dyn crate::output::OutputFormatter, policy: &StatusTransitionPolicy) {
    formatter.section(&format!("{} ({} statuses)", policy.kind(), policy.len()));
    for status in policy.statuses() {
        let marker = if status.is_terminal() { " [terminal]" } else { "" };
        formatter.info(&format!("{} - {}{}", status.id(), status.title(), marker));
        for (role, targets) in status.rules().iter() {
            let targets: Vec<&str> = targets.iter().map(|t| t.as_str()).collect();
            formatter.info(&format!("    {} -> {}", role, targets.join(", ")));
        }
    }
}
