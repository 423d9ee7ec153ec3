//! Check command - Ask the transition policy for a decision
//!
//! Provides the `hrflow check` CLI command which evaluates one proposed
//! transition for a role set and prints the decision with the granting role.

use anyhow::Result;
use clap::Args;
use tracing::info;

use hrflow_core::config::Config;
use hrflow_core::domain::{EntityKind, StatusId};

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Entity kind (user_timesheet, user_work_schedule)
    #[arg(long, short)]
    pub kind: EntityKind,

    /// Current status
    #[arg(long)]
    pub from: StatusId,

    /// Requested status
    #[arg(long)]
    pub to: StatusId,

    /// Role held by the actor (repeatable)
    #[arg(long = "role", short)]
    pub roles: Vec<String>,

    /// Do not add the configured default role
    #[arg(long)]
    pub exact_roles: bool,
}

impl CheckCommand {
    pub fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let registry = super::load_policies(config)?;
        let actor = super::build_actor(config, "cli", &self.roles, self.exact_roles)?;

        info!(kind = %self.kind, from = %self.from, to = %self.to, "Checking transition");

        let decision = registry
            .policy(self.kind)
            .and_then(|policy| policy.evaluate(&self.from, &self.to, actor.roles()));

        match decision {
            Ok(decision) => {
                if format.is_json() {
                    let mut json = serde_json::to_value(&decision)?;
                    if let serde_json::Value::Object(map) = &mut json {
                        map.insert("allowed".into(), decision.is_allowed().into());
                        map.insert("roles".into(), serde_json::to_value(actor.roles())?);
                    }
                    formatter.print_json(&json);
                } else if decision.is_allowed() {
                    formatter.success(&format!("{} -> {}: {}", self.from, self.to, decision));
                    formatter.info(&format!("Roles: {}", actor.roles()));
                } else {
                    formatter.error(&format!("{} -> {}: {}", self.from, self.to, decision));
                    formatter.info(&format!("Roles: {}", actor.roles()));
                }
            }
            Err(e) => {
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "allowed": false,
                        "error": e.to_string(),
                    }));
                } else {
                    formatter.error(&e.to_string());
                }
            }
        }

        Ok(())
    }
}
