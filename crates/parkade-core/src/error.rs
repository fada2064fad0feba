//! Error types for the parkade system.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParkadeError {
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A business rule rejected the operation given the current state.
    /// `code` is a stable machine-readable tag such as `ALREADY_OCCUPIED`.
    #[error("Conflict ({code}): {message}")]
    Conflict { code: String, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ParkadeResult<T> = Result<T, ParkadeError>;

/// Coarse classification of a [`ParkadeError`], used by outer layers to
/// pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Database,
    Internal,
}

impl ParkadeError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Database(_) => ErrorKind::Database,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable error code. Conflicts carry their own specific code.
    pub fn code(&self) -> &str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { code, .. } => code,
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP-equivalent status for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Database | ErrorKind::Internal => 500,
        }
    }

    /// Returns `true` for conflicts carrying the given code.
    pub fn is_conflict(&self, expected: &str) -> bool {
        matches!(self, Self::Conflict { code, .. } if code == expected)
    }
}

/// Caller-facing error payload.
///
/// Persistence and internal failures are reduced to a generic message so
/// that driver details never reach the client; the full error is expected
/// to be logged by whoever builds the body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: ErrorKind,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<&ParkadeError> for ErrorBody {
    fn from(err: &ParkadeError) -> Self {
        let (message, field) = match err {
            ParkadeError::Validation { field, message } => (message.clone(), Some(field.clone())),
            ParkadeError::NotFound { .. } => (err.to_string(), None),
            ParkadeError::Conflict { message, .. } => (message.clone(), None),
            ParkadeError::Database(_) => ("Database operation failed".to_string(), None),
            ParkadeError::Internal(_) => ("An unexpected error occurred".to_string(), None),
        };
        Self {
            error: err.kind(),
            message,
            code: err.code().to_string(),
            field,
        }
    }
}
