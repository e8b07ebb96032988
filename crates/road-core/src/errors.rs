//! Cross-cutting error types for Roadtrack.
//!
//! Domain-specific errors (e.g., `DatabaseError`, `AuthError`) are defined in
//! their respective crates. The HTTP layer in `road-server` is where all crate
//! errors converge into status codes.

use thiserror::Error;

/// Errors that can be raised by any Roadtrack crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// Data failed validation (format, ranges, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Shorthand for a [`CoreError::Validation`] with a formatted message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
