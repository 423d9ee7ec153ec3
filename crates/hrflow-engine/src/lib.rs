//! HRFlow Engine - Status update pipeline
//!
//! Runs one update of a workflow entity as an explicit ordered pipeline:
//! validate transition → apply change → enqueue audit records → commit →
//! flush audit records.
//!
//! Authorization and configuration failures abort the whole update. Audit
//! persistence failures never do.

pub mod context;
pub mod error;
pub mod pipeline;

pub use context::UpdateContext;
pub use error::WorkflowError;
pub use pipeline::{UpdateOutcome, UpdatePipeline};
