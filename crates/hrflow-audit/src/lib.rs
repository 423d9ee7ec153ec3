//! HRFlow Audit - Field-level change audit logging
//!
//! Provides:
//! - A registry of loggable fields and their message templates per entity kind
//! - Capture of audit records from an update's change set
//! - A request-scoped buffer flushed only after the entity write commits

pub mod buffer;
pub mod logger;
pub mod registry;

pub use buffer::PendingAudit;
pub use logger::{CaptureContext, ChangeAuditLogger};
pub use registry::LoggableFieldRegistry;
