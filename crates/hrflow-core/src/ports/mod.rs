//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are interfaces that the domain core depends on, but whose
//! implementations live in adapter crates.
//!
//! - [`IWorkflowRepository`] - Persistent storage for workflow records and audit records

pub mod workflow_repository;

pub use workflow_repository::IWorkflowRepository;
