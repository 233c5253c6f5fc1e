//! Store Errors
//!
//! Error types for record store operations.

use uuid::Uuid;

/// Errors that can occur while staging or committing writes
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// Update of a row that does not exist
    #[error("Row not found in {table}: {id}")]
    RowNotFound { table: String, id: Uuid },

    /// Unique column constraint violated
    #[error("Unique constraint violated on {table}.{column}: {value}")]
    UniqueViolation {
        table: String,
        column: String,
        value: String,
    },
}

impl StoreError {
    /// Check if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
