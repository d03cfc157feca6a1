//! Audit log domain model (append-only).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Denied,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub org_id: Uuid,
    /// Acting principal, or `system` for fan-out-created rows.
    pub actor: String,
    /// Dotted action name (e.g., `instance.publish`).
    pub action: String,
    pub entity_id: Option<Uuid>,
    pub outcome: AuditOutcome,
    pub detail: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    pub org_id: Uuid,
    pub actor: String,
    pub action: String,
    pub entity_id: Option<Uuid>,
    pub outcome: AuditOutcome,
    pub detail: serde_json::Value,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Denied => "denied",
            AuditOutcome::Failure => "failure",
        }
    }
}
