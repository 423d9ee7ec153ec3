//! Domain entities and business logic
//!
//! This module contains the core domain types for HRFlow:
//! - Newtypes for type-safe identifiers
//! - Statuses and their per-role transition rules
//! - Actors and role sets
//! - Workflow records and the change sets an update produces
//! - Audit records and their message templates
//! - Domain-specific error types

pub mod actor;
pub mod audit;
pub mod change_set;
pub mod errors;
pub mod newtypes;
pub mod status;
pub mod template;
pub mod workflow;

// Re-export commonly used types
pub use actor::{Actor, RoleSet, DEFAULT_ROLE};
pub use audit::AuditRecord;
pub use change_set::{ChangeSet, FieldChange, FieldValue};
pub use errors::DomainError;
pub use newtypes::*;
pub use status::{Status, TransitionRules};
pub use template::MessageTemplate;
pub use workflow::{ProposedUpdate, WorkflowEntity, WorkflowRecord, STATUS_FIELD};
