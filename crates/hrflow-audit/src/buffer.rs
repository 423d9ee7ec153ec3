//! Request-scoped audit buffer
//!
//! Records captured during one update wait here until the entity write has
//! committed. A buffer holds at most one record per (entity, field, old, new)
//! combination, so capturing the same change twice persists it once. Flushing
//! empties the buffer whether or not the store accepted the batch.

use std::collections::HashSet;

use hrflow_core::domain::{AuditRecord, EntityRef, FieldChange};
use hrflow_core::ports::IWorkflowRepository;

type ChangeKey = (EntityRef, String, FieldChange);

/// Pending audit records of one update
#[derive(Debug, Default)]
pub struct PendingAudit {
    records: Vec<AuditRecord>,
    seen: HashSet<ChangeKey>,
}

impl PendingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers `record`, which describes `change`
    ///
    /// Returns false if an identical change of the same field on the same
    /// entity is already buffered; the record is then dropped.
    pub fn enqueue(&mut self, record: AuditRecord, change: &FieldChange) -> bool {
        let key = (*record.entity(), record.field().to_string(), change.clone());
        if !self.seen.insert(key) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Returns the buffered records in capture order
    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every buffered record without persisting it
    ///
    /// Used when the entity write failed: audit records must never outlive
    /// the change they describe.
    pub fn discard(&mut self) -> usize {
        let dropped = self.records.len();
        self.records.clear();
        self.seen.clear();
        dropped
    }

    /// Persists the buffered records as one batch and empties the buffer
    ///
    /// The buffer is empty afterwards even when the store fails, so a retry
    /// of the same request context cannot write the batch twice. An empty
    /// buffer does not touch the store.
    pub async fn flush(&mut self, repo: &dyn IWorkflowRepository) -> anyhow::Result<Vec<AuditRecord>> {
        let records = std::mem::take(&mut self.records);
        self.seen.clear();
        if records.is_empty() {
            return Ok(Vec::new());
        }
        repo.save_audit_batch(&records).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use hrflow_core::domain::{
        ActorId, AuditId, EntityId, EntityKind, FieldValue, WorkflowRecord,
    };

    use super::*;

    /// Records every batch it receives
    #[derive(Default)]
    struct BatchRepo {
        batches: Mutex<Vec<Vec<AuditRecord>>>,
    }

    impl BatchRepo {
        fn batches(&self) -> Vec<Vec<AuditRecord>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IWorkflowRepository for BatchRepo {
        async fn get_record(&self, _e: &EntityRef) -> anyhow::Result<Option<WorkflowRecord>> {
            Ok(None)
        }
        async fn save_record(&self, _r: &WorkflowRecord) -> anyhow::Result<()> {
            Ok(())
        }
        async fn next_entity_id(&self, _k: EntityKind) -> anyhow::Result<EntityId> {
            Ok(EntityId::new(1))
        }
        async fn list_records(&self, _k: EntityKind) -> anyhow::Result<Vec<WorkflowRecord>> {
            Ok(vec![])
        }
        async fn save_audit_batch(&self, records: &[AuditRecord]) -> anyhow::Result<Vec<AuditRecord>> {
            let mut batches = self.batches.lock().unwrap();
            let stored: Vec<AuditRecord> = records
                .iter()
                .enumerate()
                .map(|(i, r)| r.clone().with_id(AuditId::new(i as i64 + 1)))
                .collect();
            batches.push(stored.clone());
            Ok(stored)
        }
        async fn get_audit_trail(&self, _e: &EntityRef) -> anyhow::Result<Vec<AuditRecord>> {
            Ok(vec![])
        }
        async fn get_audit_since(
            &self,
            _since: DateTime<Utc>,
            _limit: u32,
        ) -> anyhow::Result<Vec<AuditRecord>> {
            Ok(vec![])
        }
    }

    /// Rejects every audit batch
    struct FailingRepo;

    #[async_trait]
    impl IWorkflowRepository for FailingRepo {
        async fn get_record(&self, _e: &EntityRef) -> anyhow::Result<Option<WorkflowRecord>> {
            Ok(None)
        }
        async fn save_record(&self, _r: &WorkflowRecord) -> anyhow::Result<()> {
            Ok(())
        }
        async fn next_entity_id(&self, _k: EntityKind) -> anyhow::Result<EntityId> {
            Ok(EntityId::new(1))
        }
        async fn list_records(&self, _k: EntityKind) -> anyhow::Result<Vec<WorkflowRecord>> {
            Ok(vec![])
        }
        async fn save_audit_batch(&self, _r: &[AuditRecord]) -> anyhow::Result<Vec<AuditRecord>> {
            anyhow::bail!("audit table is read-only")
        }
        async fn get_audit_trail(&self, _e: &EntityRef) -> anyhow::Result<Vec<AuditRecord>> {
            Ok(vec![])
        }
        async fn get_audit_since(
            &self,
            _since: DateTime<Utc>,
            _limit: u32,
        ) -> anyhow::Result<Vec<AuditRecord>> {
            Ok(vec![])
        }
    }

    fn entity() -> EntityRef {
        EntityRef::new(EntityKind::UserTimesheet, EntityId::new(7))
    }

    fn change(old: i64, new: i64) -> FieldChange {
        FieldChange {
            old: FieldValue::Int(old),
            new: FieldValue::Int(new),
        }
    }

    fn record(message: &str) -> AuditRecord {
        AuditRecord::new(entity(), ActorId::new("hr.admin").unwrap(), "status", message)
    }

    #[test]
    fn test_enqueue_deduplicates_identical_changes() {
        let mut buffer = PendingAudit::new();
        assert!(buffer.enqueue(record("0 -> 3"), &change(0, 3)));
        assert!(!buffer.enqueue(record("0 -> 3"), &change(0, 3)));
        assert!(buffer.enqueue(record("3 -> 4"), &change(3, 4)));
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_discard_empties_buffer() {
        let mut buffer = PendingAudit::new();
        buffer.enqueue(record("0 -> 3"), &change(0, 3));
        assert_eq!(buffer.discard(), 1);
        assert!(buffer.is_empty());

        // The same change may be captured again after a discard
        assert!(buffer.enqueue(record("0 -> 3"), &change(0, 3)));
    }

    #[tokio::test]
    async fn test_flush_persists_and_clears() {
        let repo = BatchRepo::default();
        let mut buffer = PendingAudit::new();
        buffer.enqueue(record("0 -> 3"), &change(0, 3));

        let stored = buffer.flush(&repo).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id(), Some(AuditId::new(1)));
        assert!(buffer.is_empty());

        // A second flush writes nothing
        let stored = buffer.flush(&repo).await.unwrap();
        assert!(stored.is_empty());
        assert_eq!(repo.batches().len(), 1);
    }

    #[tokio::test]
    async fn test_flush_clears_even_on_failure() {
        let mut buffer = PendingAudit::new();
        buffer.enqueue(record("0 -> 3"), &change(0, 3));

        let result = buffer.flush(&FailingRepo).await;
        assert!(result.is_err());
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_empty_flush_skips_store() {
        let mut buffer = PendingAudit::new();
        let stored = buffer.flush(&FailingRepo).await.unwrap();
        assert!(stored.is_empty());
    }
}
