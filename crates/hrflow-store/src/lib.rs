//! HRFlow Store - Workflow and audit persistence
//!
//! Implements the `IWorkflowRepository` port from `hrflow-core` with
//! concurrent in-memory maps. It is a driven (secondary) adapter in the
//! hexagonal architecture, used by the CLI and by integration tests.
//!
//! ## Key Components
//!
//! - [`InMemoryWorkflowRepository`] - Full `IWorkflowRepository` implementation
//! - [`StoreError`] - Error types for store operations
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use hrflow_core::ports::IWorkflowRepository;
//! use hrflow_store::InMemoryWorkflowRepository;
//!
//! let repo: Arc<dyn IWorkflowRepository> = Arc::new(InMemoryWorkflowRepository::new());
//! # let _ = repo;
//! ```

pub mod memory;

pub use memory::InMemoryWorkflowRepository;

use hrflow_core::domain::EntityRef;

/// Errors that can occur during store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The record was modified by someone else since it was read
    #[error("Version conflict on {entity}: stored version {stored}, write carries {attempted}")]
    VersionConflict {
        entity: EntityRef,
        stored: u64,
        attempted: u64,
    },
}
