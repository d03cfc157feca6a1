//! Error types for the CompassIQ core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompassError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("OWNER/ADMIN permission required")]
    Forbidden,

    #[error("Demo org is read-only")]
    DemoReadOnly,

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompassError {
    /// Stable machine-readable code for the UI layer, when one exists.
    ///
    /// `DEMO_READ_ONLY` is the one the excluded UI special-cases; the
    /// rest are provided so toasts can branch without string matching.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            CompassError::DemoReadOnly => Some("DEMO_READ_ONLY"),
            CompassError::Forbidden => Some("FORBIDDEN"),
            CompassError::NotFound { .. } => Some("NOT_FOUND"),
            CompassError::AlreadyExists { .. } => Some("ALREADY_EXISTS"),
            CompassError::Conflict { .. } => Some("CONFLICT"),
            CompassError::Validation { .. } => Some("VALIDATION"),
            CompassError::Database(_) | CompassError::Internal(_) => None,
        }
    }
}

pub type CompassResult<T> = Result<T, CompassError>;
