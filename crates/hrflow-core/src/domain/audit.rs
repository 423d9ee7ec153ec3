//! Audit record domain entity
//!
//! An [`AuditRecord`] describes one detected change to one loggable field of
//! one workflow entity. Records are immutable once created; the only thing a
//! store adds is its own identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{ActorId, AuditId, EntityRef, RequestId};

/// An immutable log entry describing one field's before/after change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique identifier for this record (assigned by the store)
    id: Option<AuditId>,
    /// The entity whose field changed
    entity: EntityRef,
    /// When the change was captured
    timestamp: DateTime<Utc>,
    /// Who made the change
    actor: ActorId,
    /// Name of the changed field
    field: String,
    /// Message template populated with the old and new value
    message: String,
    /// Optional label of what triggered the change
    trigger: Option<String>,
    /// Update request this record belongs to
    request_id: Option<RequestId>,
}

impl AuditRecord {
    /// Creates a new audit record timestamped now
    ///
    /// The `id` field is set to `None` and will be assigned by the store
    /// when the record is persisted.
    ///
    /// # Example
    ///
    /// ```
    /// use hrflow_core::domain::audit::AuditRecord;
    /// use hrflow_core::domain::newtypes::{ActorId, EntityId, EntityKind, EntityRef};
    ///
    /// let entity = EntityRef::new(EntityKind::UserTimesheet, EntityId::new(1));
    /// let actor = ActorId::new("admin").unwrap();
    /// let record = AuditRecord::new(entity, actor, "status", "Changed status from 0 to 3");
    /// assert!(record.id().is_none()); // ID assigned on persist
    /// assert_eq!(record.message(), "Changed status from 0 to 3");
    /// ```
    pub fn new(
        entity: EntityRef,
        actor: ActorId,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            entity,
            timestamp: Utc::now(),
            actor,
            field: field.into(),
            message: message.into(),
            trigger: None,
            request_id: None,
        }
    }

    /// Returns the record ID (None if not yet persisted)
    pub fn id(&self) -> Option<AuditId> {
        self.id
    }

    /// Sets the ID for this record (called by the store on insert)
    pub fn with_id(mut self, id: AuditId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trigger(&self) -> Option<&str> {
        self.trigger.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Sets the trigger label
    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    /// Sets the originating request
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Overrides the capture timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
