//! Error types for the update pipeline

use hrflow_core::domain::{ActorId, DomainError, EntityRef, StatusId};
use hrflow_policy::PolicyError;
use thiserror::Error;

/// Errors that abort an update or creation
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No role held by the actor permits the status transition
    #[error("{actor} may not move {entity} from {from} to {to}")]
    AuthorizationDenied {
        entity: EntityRef,
        actor: ActorId,
        from: StatusId,
        to: StatusId,
    },

    /// Broken status reference data (unknown current status, missing rule table)
    #[error("workflow configuration error: {0}")]
    Configuration(PolicyError),

    /// Configuration rejected while building the pipeline
    #[error("invalid configuration: {0}")]
    InvalidConfig(DomainError),

    /// The request itself is invalid
    #[error("validation failed: {0}")]
    Validation(String),

    /// The entity does not exist
    #[error("entity not found: {0}")]
    EntityNotFound(EntityRef),

    /// The repository failed
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<PolicyError> for WorkflowError {
    fn from(err: PolicyError) -> Self {
        if err.is_client_error() {
            WorkflowError::Validation(err.to_string())
        } else {
            WorkflowError::Configuration(err)
        }
    }
}

impl WorkflowError {
    /// Returns true for errors the caller can correct (4xx-class)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WorkflowError::AuthorizationDenied { .. }
                | WorkflowError::Validation(_)
                | WorkflowError::EntityNotFound(_)
        )
    }
}
