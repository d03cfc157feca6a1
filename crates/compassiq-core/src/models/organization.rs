//! Organization domain model.
//!
//! Organizations are the tenancy unit: every other row in the system
//! is scoped to exactly one, and deleting one cascades to all of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An isolated customer workspace.
///
/// Demo organizations (`is_demo`) are globally read-only for safety
/// during sales demos, regardless of the caller's role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    /// Human-readable display name.
    pub name: String,
    /// URL-safe unique identifier (e.g., `meridian-construction`).
    pub slug: String,
    pub is_demo: bool,
    /// Arbitrary key-value metadata.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub slug: String,
    pub is_demo: bool,
    pub metadata: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing organization.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub is_demo: Option<bool>,
    pub metadata: Option<serde_json::Value>,
}
