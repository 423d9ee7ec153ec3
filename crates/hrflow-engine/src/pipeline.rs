//! Update pipeline
//!
//! The [`UpdatePipeline`] runs one status/attribute update of a workflow
//! entity against the repository.
//!
//! ## Update Flow
//!
//! 1. **Load**: fetch the current record (missing → `EntityNotFound`)
//! 2. **Diff**: compute the change set of the proposed update
//! 3. **Authorize**: if the status changes, consult the kind's transition policy
//! 4. **Apply**: apply the change to a copy and advance its version
//! 5. **Capture**: build audit records into a request-scoped buffer
//! 6. **Commit**: save the record; on failure the buffer is discarded
//! 7. **Flush**: save the buffered audit records; failures are logged only
//!
//! Nothing is written before step 6, so a rejected update leaves no trace.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use hrflow_audit::{ChangeAuditLogger, LoggableFieldRegistry, PendingAudit};
use hrflow_core::config::Config;
use hrflow_core::domain::{
    Actor, AuditRecord, ChangeSet, EntityKind, EntityRef, FieldValue, ProposedUpdate, StatusId,
    WorkflowEntity, WorkflowRecord, STATUS_FIELD,
};
use hrflow_core::ports::IWorkflowRepository;
use hrflow_policy::{Decision, PolicyRegistry};

use crate::context::UpdateContext;
use crate::error::WorkflowError;

/// Result of a successful update
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// The record as committed (unchanged if the update was a no-op)
    pub record: WorkflowRecord,
    /// Fields that actually changed
    pub changes: ChangeSet,
    /// Policy decision, present when the status changed
    pub decision: Option<Decision>,
    /// Audit records: as stored when flushed, as captured otherwise
    pub audit: Vec<AuditRecord>,
    /// False if the audit records could not be persisted
    pub audit_flushed: bool,
}

impl UpdateOutcome {
    /// Returns true if nothing changed and nothing was written
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Runs updates and creations of workflow entities
pub struct UpdatePipeline {
    policies: Arc<PolicyRegistry>,
    audit_logger: ChangeAuditLogger,
    repository: Arc<dyn IWorkflowRepository>,
}

impl UpdatePipeline {
    /// Creates a pipeline from its collaborators
    pub fn new(
        policies: Arc<PolicyRegistry>,
        audit_logger: ChangeAuditLogger,
        repository: Arc<dyn IWorkflowRepository>,
    ) -> Self {
        Self {
            policies,
            audit_logger,
            repository,
        }
    }

    /// Builds the policy registry and the field registry from `config`
    ///
    /// # Errors
    ///
    /// - `WorkflowError::Configuration` if a status catalog is invalid
    /// - `WorkflowError::InvalidConfig` if an audit message template is invalid
    pub fn from_config(
        config: &Config,
        repository: Arc<dyn IWorkflowRepository>,
    ) -> Result<Self, WorkflowError> {
        let policies = PolicyRegistry::from_config(config).map_err(WorkflowError::Configuration)?;
        let fields = LoggableFieldRegistry::from_config(config).map_err(WorkflowError::InvalidConfig)?;
        Ok(Self::new(
            Arc::new(policies),
            ChangeAuditLogger::new(Arc::new(fields)),
            repository,
        ))
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    pub fn repository(&self) -> &Arc<dyn IWorkflowRepository> {
        &self.repository
    }

    /// Applies `proposed` to the entity behind `entity`
    ///
    /// # Errors
    ///
    /// - `EntityNotFound` if the entity does not exist
    /// - `AuthorizationDenied` if no held role permits the status change
    /// - `Configuration` if the current status or the kind's rule table is missing
    /// - `Validation` if the target status is not in the catalog
    /// - `Storage` if loading or committing the record fails
    #[tracing::instrument(
        skip(self, ctx, proposed),
        fields(actor = %ctx.actor.id(), request_id = %ctx.request_id)
    )]
    pub async fn update(
        &self,
        ctx: &UpdateContext,
        entity: EntityRef,
        proposed: &ProposedUpdate,
    ) -> Result<UpdateOutcome, WorkflowError> {
        // Step 1: load
        let current = self.load(entity).await?;

        // Step 2: diff
        let changes = current.diff(proposed);
        if changes.is_empty() {
            debug!(entity = %entity, "Update changes nothing");
            return Ok(UpdateOutcome {
                record: current,
                changes,
                decision: None,
                audit: Vec::new(),
                audit_flushed: true,
            });
        }

        // Step 3: authorize
        let decision = match (&proposed.status, changes.has_changed_field(STATUS_FIELD)) {
            (Some(target), true) => Some(self.authorize(ctx, &current, target)?),
            _ => None,
        };

        // Step 4: apply
        let mut updated = current.clone();
        updated.apply(proposed);

        // Step 5: capture
        let mut buffer = PendingAudit::new();
        let captured =
            self.audit_logger
                .capture_changes(&updated, &changes, ctx.capture_context(), &mut buffer);

        // Step 6: commit
        if let Err(e) = self.repository.save_record(&updated).await {
            let dropped = buffer.discard();
            debug!(entity = %entity, dropped, "Commit failed, audit buffer discarded");
            return Err(WorkflowError::Storage(
                e.context(format!("Failed to commit {entity}")),
            ));
        }

        // Step 7: flush
        let (audit, audit_flushed) = match self
            .audit_logger
            .flush(&mut buffer, self.repository.as_ref())
            .await
        {
            Some(stored) => (stored, true),
            None => (captured, false),
        };

        info!(
            entity = %entity,
            version = updated.version(),
            from = %current.status(),
            to = %updated.status(),
            changed = changes.len(),
            audited = audit.len(),
            audit_flushed,
            "Record updated"
        );

        Ok(UpdateOutcome {
            record: updated,
            changes,
            decision,
            audit,
            audit_flushed,
        })
    }

    /// Creates a record of `kind` in `status`
    ///
    /// The initial status is not subject to the transition policy but must
    /// exist in the kind's catalog. Creation writes no audit records.
    #[tracing::instrument(
        skip(self, ctx, attributes),
        fields(actor = %ctx.actor.id(), request_id = %ctx.request_id)
    )]
    pub async fn create(
        &self,
        ctx: &UpdateContext,
        kind: EntityKind,
        status: StatusId,
        attributes: BTreeMap<String, FieldValue>,
    ) -> Result<WorkflowRecord, WorkflowError> {
        let policy = self.policies.policy(kind)?;
        if !policy.contains(&status) {
            return Err(WorkflowError::Validation(format!(
                "status {status} does not exist for {kind}"
            )));
        }
        if attributes.contains_key(STATUS_FIELD) {
            return Err(WorkflowError::Validation(format!(
                "attribute name '{STATUS_FIELD}' is reserved"
            )));
        }

        let id = self
            .repository
            .next_entity_id(kind)
            .await
            .context("Failed to allocate entity id")?;

        let record = attributes.into_iter().fold(
            WorkflowRecord::new(kind, id, ctx.actor.id().clone(), status),
            |record, (name, value)| record.with_attribute(name, value),
        );

        self.repository
            .save_record(&record)
            .await
            .with_context(|| format!("Failed to create {}", record.entity_ref()))?;

        info!(entity = %record.entity_ref(), status = %record.status(), "Record created");
        Ok(record)
    }

    /// Returns the statuses `actor` may move the entity into
    pub async fn allowed_targets(
        &self,
        actor: &Actor,
        entity: EntityRef,
    ) -> Result<BTreeSet<StatusId>, WorkflowError> {
        let record = self.load(entity).await?;
        let targets = self
            .policies
            .policy(entity.kind)?
            .allowed_targets(record.status(), actor.roles())?;
        Ok(targets)
    }

    async fn load(&self, entity: EntityRef) -> Result<WorkflowRecord, WorkflowError> {
        self.repository
            .get_record(&entity)
            .await
            .with_context(|| format!("Failed to load {entity}"))?
            .ok_or(WorkflowError::EntityNotFound(entity))
    }

    fn authorize(
        &self,
        ctx: &UpdateContext,
        current: &WorkflowRecord,
        target: &StatusId,
    ) -> Result<Decision, WorkflowError> {
        let entity = current.entity_ref();
        let decision = self
            .policies
            .policy(entity.kind)?
            .evaluate(current.status(), target, ctx.actor.roles())?;

        if let Decision::Denied = decision {
            warn!(
                entity = %entity,
                from = %current.status(),
                to = %target,
                roles = %ctx.actor.roles(),
                "Status transition denied"
            );
            return Err(WorkflowError::AuthorizationDenied {
                entity,
                actor: ctx.actor.id().clone(),
                from: current.status().clone(),
                to: target.clone(),
            });
        }

        Ok(decision)
    }
}
