//! Membership domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rbac::Role;

/// Links a principal (email identity) to an organization with exactly
/// one role. Unique per (org, principal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub org_id: Uuid,
    pub principal: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    pub org_id: Uuid,
    pub principal: String,
    pub role: Role,
}
