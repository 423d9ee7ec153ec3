//! Workflow entities
//!
//! A workflow entity carries exactly one current [`StatusId`] whose changes
//! are governed by a transition policy. [`WorkflowRecord`] is the generic
//! stored form used for timesheets and work schedules: the status plus an
//! open set of attributes (period, profile, ...).
//!
//! ## Lifecycle
//!
//! ```text
//!   create(status)  ──►  [status S]  ──update(status T, policy ok)──►  [status T]
//!   (no policy check)         │
//!                             └──update(attributes only)──► [status S]
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::change_set::{ChangeSet, FieldValue};
use super::newtypes::{ActorId, EntityId, EntityKind, EntityRef, StatusId};

/// Name of the policy-controlled field in change sets and loggable-field tables
pub const STATUS_FIELD: &str = "status";

/// An entity whose status field is governed by a transition policy
pub trait WorkflowEntity {
    /// Returns the reference identifying this entity
    fn entity_ref(&self) -> EntityRef;

    /// Returns the current status
    fn status(&self) -> &StatusId;
}

/// Proposed new values for one update of a workflow entity
///
/// Fields that are not mentioned keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedUpdate {
    #[serde(default)]
    pub status: Option<StatusId>,
    #[serde(default)]
    pub attributes: BTreeMap<String, FieldValue>,
}

impl ProposedUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Proposes a new status
    pub fn with_status(mut self, status: StatusId) -> Self {
        self.status = Some(status);
        self
    }

    /// Proposes a new value for an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.attributes.is_empty()
    }
}

/// Stored state of one timesheet or work schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    kind: EntityKind,
    id: EntityId,
    owner: ActorId,
    status: StatusId,
    attributes: BTreeMap<String, FieldValue>,
    /// Optimistic concurrency counter; starts at 1 and grows by one per committed update
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WorkflowRecord {
    /// Creates a record in its initial status
    pub fn new(kind: EntityKind, id: EntityId, owner: ActorId, status: StatusId) -> Self {
        let now = Utc::now();
        Self {
            kind,
            id,
            owner,
            status,
            attributes: BTreeMap::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets an attribute at construction time
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn owner(&self) -> &ActorId {
        &self.owner
    }

    pub fn attributes(&self) -> &BTreeMap<String, FieldValue> {
        &self.attributes
    }

    /// Returns an attribute value, `Null` when unset
    pub fn attribute(&self, name: &str) -> FieldValue {
        self.attributes.get(name).cloned().unwrap_or_default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Computes the change set `proposed` would produce against this record
    ///
    /// The status is reported under [`STATUS_FIELD`]; an attribute named
    /// like the status field is ignored.
    pub fn diff(&self, proposed: &ProposedUpdate) -> ChangeSet {
        let mut changes = ChangeSet::new();
        if let Some(status) = &proposed.status {
            changes.record(STATUS_FIELD, &self.status, status);
        }
        for (name, value) in &proposed.attributes {
            if name == STATUS_FIELD {
                continue;
            }
            changes.record(name.clone(), self.attribute(name), value.clone());
        }
        changes
    }

    /// Applies `proposed` and advances the version
    pub fn apply(&mut self, proposed: &ProposedUpdate) {
        if let Some(status) = &proposed.status {
            self.status = status.clone();
        }
        for (name, value) in &proposed.attributes {
            if name == STATUS_FIELD {
                continue;
            }
            self.attributes.insert(name.clone(), value.clone());
        }
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

impl WorkflowEntity for WorkflowRecord {
    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind, self.id)
    }

    fn status(&self) -> &StatusId {
        &self.status
    }
}
