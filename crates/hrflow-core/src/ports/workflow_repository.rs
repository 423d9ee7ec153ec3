//! Workflow repository port (driven/secondary port)
//!
//! This module defines the interface for persisting workflow records and
//! the audit records produced by their updates.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   and don't need domain-level classification.
//! - `save_record` is the commit point of an update. Audit records are only
//!   handed to `save_audit_batch` after it has succeeded.
//! - Concurrent updates of one record are serialized through the record's
//!   `version`: an adapter must refuse a write whose version is not exactly
//!   one greater than the stored one.

use chrono::{DateTime, Utc};

use crate::domain::{AuditRecord, EntityId, EntityKind, EntityRef, WorkflowRecord};

/// Port trait for workflow and audit persistence
#[async_trait::async_trait]
pub trait IWorkflowRepository: Send + Sync {
    // --- WorkflowRecord operations ---

    /// Retrieves a record by reference
    async fn get_record(&self, entity: &EntityRef) -> anyhow::Result<Option<WorkflowRecord>>;

    /// Saves a record (insert or update)
    ///
    /// Updates must carry `version == stored.version + 1`; any other version
    /// is a concurrent modification and is rejected.
    async fn save_record(&self, record: &WorkflowRecord) -> anyhow::Result<()>;

    /// Allocates the next free id for a record of `kind`
    async fn next_entity_id(&self, kind: EntityKind) -> anyhow::Result<EntityId>;

    /// Lists all records of `kind`, ordered by id
    async fn list_records(&self, kind: EntityKind) -> anyhow::Result<Vec<WorkflowRecord>>;

    // --- Audit operations ---

    /// Persists a batch of audit records, assigning ids
    ///
    /// Returns the records as stored (with ids), in input order.
    async fn save_audit_batch(&self, records: &[AuditRecord]) -> anyhow::Result<Vec<AuditRecord>>;

    /// Retrieves all audit records of one entity
    ///
    /// Returns records ordered by timestamp (oldest first).
    async fn get_audit_trail(&self, entity: &EntityRef) -> anyhow::Result<Vec<AuditRecord>>;

    /// Retrieves audit records since a given timestamp, up to a limit
    ///
    /// Returns records ordered by timestamp (newest first).
    async fn get_audit_since(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> anyhow::Result<Vec<AuditRecord>>;
}
