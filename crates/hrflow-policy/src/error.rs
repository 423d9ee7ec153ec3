//! Error types for the transition policy

use hrflow_core::domain::{EntityKind, StatusId};
use thiserror::Error;

/// Errors raised while building or consulting a transition policy
///
/// `UnknownStatus`, `MissingRuleTable`, `DuplicateStatus` and
/// `InvalidDefinition` describe broken reference data. `UnknownTarget` is the
/// only variant caused by the caller's input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The entity's current status is not in its kind's catalog
    #[error("unknown status {status} in {kind} catalog")]
    UnknownStatus { kind: EntityKind, status: StatusId },

    /// The requested target status is not in the kind's catalog
    #[error("unknown target status {status} in {kind} catalog")]
    UnknownTarget { kind: EntityKind, status: StatusId },

    /// No status catalog is configured for the entity kind
    #[error("no rule table configured for {0}")]
    MissingRuleTable(EntityKind),

    /// A status id appears twice in one catalog
    #[error("duplicate status {status} in {kind} catalog")]
    DuplicateStatus { kind: EntityKind, status: StatusId },

    /// A configured status definition could not be converted
    #[error("invalid status definition in {kind} catalog: {reason}")]
    InvalidDefinition { kind: EntityKind, reason: String },
}

impl PolicyError {
    /// Returns true if the error stems from the request rather than the reference data
    pub fn is_client_error(&self) -> bool {
        matches!(self, PolicyError::UnknownTarget { .. })
    }
}
