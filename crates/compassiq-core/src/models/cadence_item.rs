//! Cadence item domain model.
//!
//! Recurring-review agenda entries generated from a template's cadence
//! rules at publication. Read-mostly after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceItem {
    pub id: Uuid,
    pub org_id: Uuid,
    pub instance_id: Uuid,
    /// Cadence label (e.g., `weekly`, `monthly`).
    pub cadence: String,
    pub title: String,
    /// The cadence-rule entry that produced this item, copied verbatim.
    pub rules: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A row to insert during publication fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCadenceItem {
    pub org_id: Uuid,
    pub instance_id: Uuid,
    pub cadence: String,
    pub title: String,
    pub rules: serde_json::Value,
}
