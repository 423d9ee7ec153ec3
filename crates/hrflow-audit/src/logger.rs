//! ChangeAuditLogger - turns change sets into audit records
//!
//! For every changed field that is registered as loggable on the entity's
//! kind, one [`AuditRecord`] is built from the field's message template and
//! buffered in the caller's [`PendingAudit`]. The acting principal is passed
//! in on every call; the logger holds no per-request state.
//!
//! A status change must be approved by the transition policy before it is
//! handed to [`ChangeAuditLogger::capture_changes`].

use std::sync::Arc;

use hrflow_core::domain::{Actor, AuditRecord, ChangeSet, RequestId, WorkflowEntity};
use hrflow_core::ports::IWorkflowRepository;
use tracing::{debug, trace, warn};

use crate::buffer::PendingAudit;
use crate::registry::LoggableFieldRegistry;

/// Per-call context of one capture
#[derive(Debug, Clone, Copy)]
pub struct CaptureContext<'a> {
    pub actor: &'a Actor,
    pub trigger: Option<&'a str>,
    pub request_id: Option<RequestId>,
}

impl<'a> CaptureContext<'a> {
    pub fn new(actor: &'a Actor) -> Self {
        Self {
            actor,
            trigger: None,
            request_id: None,
        }
    }

    pub fn with_trigger(mut self, trigger: &'a str) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }
}

/// Builds audit records for loggable field changes
#[derive(Debug, Clone)]
pub struct ChangeAuditLogger {
    registry: Arc<LoggableFieldRegistry>,
}

impl ChangeAuditLogger {
    /// Creates a logger backed by the given field registry
    pub fn new(registry: Arc<LoggableFieldRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the field registry
    pub fn registry(&self) -> &LoggableFieldRegistry {
        &self.registry
    }

    /// Captures one record per loggable changed field of `entity`
    ///
    /// Records are appended to `buffer` and also returned. A change already
    /// present in `buffer` is returned again but not buffered twice. Fields
    /// without a template are skipped.
    pub fn capture_changes<E: WorkflowEntity>(
        &self,
        entity: &E,
        changes: &ChangeSet,
        ctx: CaptureContext<'_>,
        buffer: &mut PendingAudit,
    ) -> Vec<AuditRecord> {
        let entity_ref = entity.entity_ref();
        let mut captured = Vec::new();

        for (field, change) in changes.iter() {
            let Some(template) = self.registry.template_for(entity_ref.kind, field) else {
                trace!(entity = %entity_ref, field, "Field not configured for logging");
                continue;
            };

            let message = template.render(&change.old, &change.new);
            let mut record = AuditRecord::new(entity_ref, ctx.actor.id().clone(), field, message);
            if let Some(trigger) = ctx.trigger {
                record = record.with_trigger(trigger);
            }
            if let Some(request_id) = ctx.request_id {
                record = record.with_request_id(request_id);
            }

            if !buffer.enqueue(record.clone(), change) {
                trace!(entity = %entity_ref, field, "Change already buffered");
            }
            captured.push(record);
        }

        debug!(
            entity = %entity_ref,
            actor = %ctx.actor.id(),
            changed = changes.len(),
            captured = captured.len(),
            pending = buffer.len(),
            "Changes captured"
        );

        captured
    }

    /// Flushes `buffer` to `repo`, swallowing store errors
    ///
    /// Returns the stored records, or `None` if the store failed. Audit
    /// failures are logged and never propagated.
    pub async fn flush(
        &self,
        buffer: &mut PendingAudit,
        repo: &dyn IWorkflowRepository,
    ) -> Option<Vec<AuditRecord>> {
        let pending = buffer.len();
        match buffer.flush(repo).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!(error = %e, dropped = pending, "Failed to save audit records");
                None
            }
        }
    }
}
