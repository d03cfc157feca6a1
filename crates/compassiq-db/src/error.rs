//! Database-specific error types and conversions.
//!
//! Transaction guards abort with `THROW`n marker strings; `map_throw`
//! translates those markers back into typed errors.

use compassiq_core::error::CompassError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Conflict: {reason}")]
    Conflict(String),
}

impl From<DbError> for CompassError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CompassError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => CompassError::AlreadyExists { entity },
            DbError::Conflict(reason) => CompassError::Conflict { reason },
            other => CompassError::Database(other.to_string()),
        }
    }
}

/// Marker strings thrown inside check-and-mutate transactions.
pub(crate) mod marker {
    pub const INSTANCE_NOT_FOUND: &str = "instance_not_found";
    pub const INSTANCE_NOT_DRAFT: &str = "instance_not_draft";
    pub const INSTANCE_NOT_PUBLISHED: &str = "instance_not_published";
    pub const MEMBERSHIP_NOT_FOUND: &str = "membership_not_found";
    pub const LAST_OWNER: &str = "last_owner";
    pub const INVITE_NOT_FOUND: &str = "invite_not_found";
    pub const INVITE_EXPIRED: &str = "invite_expired";
}

/// Map a transaction failure to a typed error via its marker, keyed on
/// the entity/id the caller was operating on.
pub(crate) fn map_throw(e: surrealdb::Error, entity: &str, id: &str) -> DbError {
    let msg = e.to_string();
    if msg.contains(marker::INSTANCE_NOT_FOUND)
        || msg.contains(marker::MEMBERSHIP_NOT_FOUND)
        || msg.contains(marker::INVITE_NOT_FOUND)
    {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    } else if msg.contains(marker::INSTANCE_NOT_DRAFT) {
        DbError::Conflict("instance is not a draft; publishing is one-way".into())
    } else if msg.contains(marker::INSTANCE_NOT_PUBLISHED) {
        DbError::Conflict("only published instances can be archived".into())
    } else if msg.contains(marker::LAST_OWNER) {
        DbError::Conflict("an organization must retain at least one OWNER".into())
    } else if msg.contains(marker::INVITE_EXPIRED) {
        DbError::Conflict("invite has expired".into())
    } else if msg.contains("already contains") {
        // Unique index violation.
        DbError::AlreadyExists {
            entity: entity.into(),
        }
    } else {
        DbError::Query(msg)
    }
}
