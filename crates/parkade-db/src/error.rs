//! Database-specific error types and conversions.

use parkade_core::error::ParkadeError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    /// A stored row could not be turned back into a domain value.
    #[error("Malformed {entity} row: {message}")]
    Decode { entity: &'static str, message: String },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl DbError {
    pub(crate) fn decode(entity: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            entity,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<DbError> for ParkadeError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ParkadeError::NotFound { entity, id },
            other => ParkadeError::Database(other.to_string()),
        }
    }
}
