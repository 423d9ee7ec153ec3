//! Targets command - List the statuses reachable from a status

use anyhow::Result;
use clap::Args;
use tracing::info;

use hrflow_core::config::Config;
use hrflow_core::domain::{EntityKind, StatusId};

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct TargetsCommand {
    /// Entity kind (user_timesheet, user_work_schedule)
    #[arg(long, short)]
    pub kind: EntityKind,

    /// Current status
    #[arg(long)]
    pub from: StatusId,

    /// Role held by the actor (repeatable)
    #[arg(long = "role", short)]
    pub roles: Vec<String>,

    /// Do not add the configured default role
    #[arg(long)]
    pub exact_roles: bool,
}

impl TargetsCommand {
    pub fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let registry = super::load_policies(config)?;
        let actor = super::build_actor(config, "cli", &self.roles, self.exact_roles)?;

        info!(kind = %self.kind, from = %self.from, "Listing reachable statuses");

        let targets = match registry
            .policy(self.kind)
            .and_then(|policy| policy.allowed_targets(&self.from, actor.roles()))
        {
            Ok(targets) => targets,
            Err(e) => {
                formatter.error(&e.to_string());
                return Ok(());
            }
        };

        if format.is_json() {
            let ids: Vec<&str> = targets.iter().map(|t| t.as_str()).collect();
            formatter.print_json(&serde_json::json!({
                "kind": self.kind,
                "from": self.from,
                "roles": actor.roles(),
                "targets": ids,
            }));
        } else if targets.is_empty() {
            formatter.warn(&format!("No status reachable from {} with {}", self.from, actor.roles()));
        } else {
            formatter.success(&format!("Reachable from {} with {}:", self.from, actor.roles()));
            for target in &targets {
                formatter.info(target.as_str());
            }
        }

        Ok(())
    }
}
