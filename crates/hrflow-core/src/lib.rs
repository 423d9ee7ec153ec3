//! HRFlow Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Status`, `Actor`, `WorkflowRecord`, `ChangeSet`, `AuditRecord`
//! - **Port definitions** - `IWorkflowRepository`, implemented by storage adapters
//! - **Configuration** - status catalogs, loggable field tables, logging settings
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! The transition policy, the audit logger and the update pipeline live in
//! their own crates and depend on this one.

pub mod config;
pub mod domain;
pub mod ports;
