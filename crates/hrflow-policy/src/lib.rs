//! HRFlow Policy - Status transition authorization
//!
//! Provides:
//! - Per-kind status catalogs compiled from configuration
//! - Role-based transition checks (any held role may authorize)
//! - Reachable-target queries for a role set

pub mod error;
pub mod policy;

pub use error::PolicyError;
pub use policy::{Decision, PolicyRegistry, StatusTransitionPolicy};
