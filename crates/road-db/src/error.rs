//! Database error types for road-db.

use road_core::enums::EntityType;
use road_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Validation, lookup, or transition failure raised by the domain layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A stored value that cannot be decoded.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Lookup failure for a single entity.
    pub fn not_found(entity_type: EntityType, id: &str) -> Self {
        Self::Core(CoreError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        })
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Core(CoreError::NotFound { .. }))
    }

    /// Whether the error is a UNIQUE or PRIMARY KEY constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::LibSql(e) if e.to_string().contains("UNIQUE constraint failed"))
    }

    /// Whether the error is a rejected write: UNIQUE, FOREIGN KEY, or CHECK.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::LibSql(e) => {
                let msg = e.to_string();
                msg.contains("constraint failed")
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Other(e.into())
    }
}
