//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including malformed identifiers, rule tables and validation failures.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Status identifier is empty or contains whitespace
    #[error("Invalid status identifier: {0:?}")]
    InvalidStatusId(String),

    /// Role name is empty or contains whitespace
    #[error("Invalid role name: {0:?}")]
    InvalidRole(String),

    /// Actor identifier (username) is empty
    #[error("Invalid actor: {0:?}")]
    InvalidActor(String),

    /// Unknown workflow entity kind
    #[error("Unknown entity kind: {0}")]
    UnknownEntityKind(String),

    /// Status rule table could not be decoded
    #[error("Invalid rule table: {0}")]
    InvalidRules(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidStatusId(String::new());
        assert_eq!(err.to_string(), "Invalid status identifier: \"\"");

        let err = DomainError::UnknownEntityKind("invoice".to_string());
        assert_eq!(err.to_string(), "Unknown entity kind: invoice");

        let err = DomainError::InvalidRules("expected object".to_string());
        assert_eq!(err.to_string(), "Invalid rule table: expected object");
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::InvalidRole("ROLE X".to_string());
        let err2 = DomainError::InvalidRole("ROLE X".to_string());
        let err3 = DomainError::InvalidRole("ROLE Y".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
