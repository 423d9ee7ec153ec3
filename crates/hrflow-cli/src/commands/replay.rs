//! Replay command - Run a scenario through the update pipeline
//!
//! Provides the `hrflow replay <file>` CLI command which:
//! 1. Creates the scenario's entities in an in-memory store
//! 2. Applies each step as one update by the step's actor
//! 3. Prints every step's outcome and the resulting audit trail per entity
//!
//! ## Scenario format
//!
//! ```yaml
//! entities:
//!   - name: march
//!     kind: user_timesheet
//!     owner: jkowalski
//!     status: TIMESHEET-STATUS-OWNER-EDIT
//!     attributes:
//!       period: "2024-03"
//! steps:
//!   - entity: march
//!     actor: jkowalski
//!     status: TIMESHEET-STATUS-OWNER-ACCEPT
//!   - entity: march
//!     actor: awisniewska
//!     roles: [ROLE_HR]
//!     trigger: month-end close
//!     status: TIMESHEET-STATUS-HR-ACCEPT
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::info;

use hrflow_core::config::Config;
use hrflow_core::domain::{
    AuditRecord, EntityKind, EntityRef, FieldValue, ProposedUpdate, StatusId, WorkflowEntity,
};
use hrflow_core::ports::IWorkflowRepository;
use hrflow_engine::{UpdateContext, UpdatePipeline};
use hrflow_store::InMemoryWorkflowRepository;

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct ReplayCommand {
    /// Path to the scenario file (YAML)
    pub file: PathBuf,
}

/// A scenario file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub entities: Vec<ScenarioEntity>,
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

/// An entity created before the steps run
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioEntity {
    pub name: String,
    pub kind: EntityKind,
    pub owner: String,
    pub status: StatusId,
    #[serde(default)]
    pub attributes: BTreeMap<String, FieldValue>,
}

/// One update request
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioStep {
    pub entity: String,
    pub actor: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default)]
    pub status: Option<StatusId>,
    #[serde(default)]
    pub attributes: BTreeMap<String, FieldValue>,
}

/// How a step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepResult {
    Updated,
    Unchanged,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub entity: String,
    pub actor: String,
    pub result: StepResult,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityTrail {
    pub entity: EntityRef,
    pub status: StatusId,
    pub version: u64,
    pub audit: Vec<AuditRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepReport>,
    pub entities: BTreeMap<String, EntityTrail>,
}

impl ReplayCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let content = std::fs::read_to_string(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.file.display()))?;

        info!(
            file = %self.file.display(),
            entities = scenario.entities.len(),
            steps = scenario.steps.len(),
            "Replaying scenario"
        );

        let report = run_scenario(config, &scenario).await?;

        if format.is_json() {
            formatter.print_json(&serde_json::to_value(&report)?);
            return Ok(());
        }

        for step in &report.steps {
            let line = format!(
                "[{}] {} by {}: {}",
                step.step, step.entity, step.actor, step.detail
            );
            match step.result {
                StepResult::Updated | StepResult::Unchanged => formatter.success(&line),
                StepResult::Rejected | StepResult::Failed => formatter.error(&line),
            }
        }

        for (name, trail) in &report.entities {
            formatter.section(&format!(
                "{} ({}, {} v{})",
                name, trail.entity, trail.status, trail.version
            ));
            if trail.audit.is_empty() {
                formatter.info("(no audit records)");
            }
            for record in &trail.audit {
                let trigger = record
                    .trigger()
                    .map(|t| format!(" [{t}]"))
                    .unwrap_or_default();
                formatter.info(&format!(
                    "{} {}: {}{}",
                    record.timestamp().format("%Y-%m-%d %H:%M:%S"),
                    record.actor(),
                    record.message(),
                    trigger
                ));
            }
        }

        Ok(())
    }
}

/// Runs `scenario` against a fresh in-memory store
pub async fn run_scenario(config: &Config, scenario: &Scenario) -> Result<ReplayReport> {
    let repo = Arc::new(InMemoryWorkflowRepository::new());
    let pipeline = UpdatePipeline::from_config(config, repo.clone())
        .context("Failed to build update pipeline")?;

    let mut refs: BTreeMap<String, EntityRef> = BTreeMap::new();
    for entity in &scenario.entities {
        if refs.contains_key(&entity.name) {
            bail!("Entity '{}' is defined twice", entity.name);
        }
        let owner = super::build_actor(config, &entity.owner, &[], false)?;
        let record = pipeline
            .create(
                &UpdateContext::new(owner),
                entity.kind,
                entity.status.clone(),
                entity.attributes.clone(),
            )
            .await
            .with_context(|| format!("Failed to create entity '{}'", entity.name))?;
        refs.insert(entity.name.clone(), record.entity_ref());
    }

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let Some(entity) = refs.get(&step.entity).copied() else {
            bail!("Step {} refers to unknown entity '{}'", index + 1, step.entity);
        };

        let actor = super::build_actor(config, &step.actor, &step.roles, false)?;
        let mut ctx = UpdateContext::new(actor);
        if let Some(trigger) = &step.trigger {
            ctx = ctx.with_trigger(trigger.clone());
        }

        let proposed = ProposedUpdate {
            status: step.status.clone(),
            attributes: step.attributes.clone(),
        };

        let (result, detail) = match pipeline.update(&ctx, entity, &proposed).await {
            Ok(outcome) if outcome.is_noop() => (StepResult::Unchanged, "no changes".to_string()),
            Ok(outcome) => {
                let mut detail = match &outcome.decision {
                    Some(decision) => format!("{} ({decision})", outcome.record.status()),
                    None => format!("{} field(s) changed", outcome.changes.len()),
                };
                if !outcome.audit_flushed {
                    detail.push_str(", audit records lost");
                }
                (StepResult::Updated, detail)
            }
            Err(e) if e.is_client_error() => (StepResult::Rejected, e.to_string()),
            Err(e) => (StepResult::Failed, e.to_string()),
        };

        steps.push(StepReport {
            step: index + 1,
            entity: step.entity.clone(),
            actor: step.actor.clone(),
            result,
            detail,
        });
    }

    let mut entities = BTreeMap::new();
    for (name, entity) in refs {
        let record = repo
            .get_record(&entity)
            .await?
            .with_context(|| format!("Entity '{name}' vanished from the store"))?;
        let audit = repo.get_audit_trail(&entity).await?;
        entities.insert(
            name,
            EntityTrail {
                entity,
                status: record.status().clone(),
                version: record.version(),
                audit,
            },
        );
    }

    Ok(ReplayReport { steps, entities })
}
