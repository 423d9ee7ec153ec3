//! In-memory implementation of the IWorkflowRepository port
//!
//! Records live in a `DashMap` keyed by [`EntityRef`]; writes go through the
//! map's entry API so the version check and the replacement happen under the
//! same shard lock. Audit records are keyed by their assigned id, which grows
//! monotonically, so id order is capture order.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hrflow_core::domain::{
    AuditId, AuditRecord, EntityId, EntityKind, EntityRef, WorkflowEntity, WorkflowRecord,
};
use hrflow_core::ports::IWorkflowRepository;
use tracing::{debug, trace};

use crate::StoreError;

/// Concurrent in-memory workflow repository
#[derive(Debug, Default)]
pub struct InMemoryWorkflowRepository {
    records: DashMap<EntityRef, WorkflowRecord>,
    /// Highest id handed out or stored, per kind
    last_ids: DashMap<EntityKind, u64>,
    audit: DashMap<AuditId, AuditRecord>,
    last_audit_id: AtomicI64,
}

impl InMemoryWorkflowRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored workflow records
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Number of stored audit records
    pub fn audit_count(&self) -> usize {
        self.audit.len()
    }

    fn bump_last_id(&self, kind: EntityKind, id: u64) {
        let mut last = self.last_ids.entry(kind).or_insert(0);
        if *last < id {
            *last = id;
        }
    }
}

#[async_trait::async_trait]
impl IWorkflowRepository for InMemoryWorkflowRepository {
    async fn get_record(&self, entity: &EntityRef) -> anyhow::Result<Option<WorkflowRecord>> {
        Ok(self.records.get(entity).map(|r| r.value().clone()))
    }

    async fn save_record(&self, record: &WorkflowRecord) -> anyhow::Result<()> {
        let entity = record.entity_ref();
        match self.records.entry(entity) {
            Entry::Occupied(mut existing) => {
                let stored = existing.get().version();
                if record.version() != stored + 1 {
                    return Err(StoreError::VersionConflict {
                        entity,
                        stored,
                        attempted: record.version(),
                    }
                    .into());
                }
                existing.insert(record.clone());
                trace!(entity = %entity, version = record.version(), "Updated record");
            }
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                trace!(entity = %entity, "Inserted record");
            }
        }
        self.bump_last_id(entity.kind, entity.id.as_u64());
        Ok(())
    }

    async fn next_entity_id(&self, kind: EntityKind) -> anyhow::Result<EntityId> {
        let mut last = self.last_ids.entry(kind).or_insert(0);
        *last += 1;
        Ok(EntityId::new(*last))
    }

    async fn list_records(&self, kind: EntityKind) -> anyhow::Result<Vec<WorkflowRecord>> {
        let mut records: Vec<WorkflowRecord> = self
            .records
            .iter()
            .filter(|r| r.key().kind == kind)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by_key(|r| r.id());
        Ok(records)
    }

    async fn save_audit_batch(&self, records: &[AuditRecord]) -> anyhow::Result<Vec<AuditRecord>> {
        let stored: Vec<AuditRecord> = records
            .iter()
            .map(|record| {
                let id = AuditId::new(self.last_audit_id.fetch_add(1, Ordering::SeqCst) + 1);
                let record = record.clone().with_id(id);
                self.audit.insert(id, record.clone());
                record
            })
            .collect();
        debug!(count = stored.len(), "Saved audit batch");
        Ok(stored)
    }

    async fn get_audit_trail(&self, entity: &EntityRef) -> anyhow::Result<Vec<AuditRecord>> {
        let mut trail: Vec<AuditRecord> = self
            .audit
            .iter()
            .filter(|r| r.value().entity() == entity)
            .map(|r| r.value().clone())
            .collect();
        trail.sort_by_key(|r| (r.timestamp(), r.id()));
        Ok(trail)
    }

    async fn get_audit_since(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> anyhow::Result<Vec<AuditRecord>> {
        let mut recent: Vec<AuditRecord> = self
            .audit
            .iter()
            .filter(|r| r.value().timestamp() > since)
            .map(|r| r.value().clone())
            .collect();
        recent.sort_by_key(|r| std::cmp::Reverse((r.timestamp(), r.id())));
        recent.truncate(limit as usize);
        Ok(recent)
    }
}
