//! Instance domain model.
//!
//! An instance is a tenant's concrete deployment of one template. The
//! template reference is pinned at creation — later template edits do
//! not retroactively affect existing instances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CompassError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: Uuid,
    pub org_id: Uuid,
    pub template_id: Uuid,
    pub name: String,
    pub status: InstanceStatus,
    /// Set exactly once, on the draft→published transition.
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstance {
    pub org_id: Uuid,
    pub template_id: Uuid,
    pub name: String,
}

/// An instance joined with its template's display fields, for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceWithTemplate {
    #[serde(flatten)]
    pub instance: Instance,
    pub template_key: String,
    pub template_name: String,
    pub template_description: String,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Draft => "draft",
            InstanceStatus::Published => "published",
            InstanceStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = CompassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InstanceStatus::Draft),
            "published" => Ok(InstanceStatus::Published),
            "archived" => Ok(InstanceStatus::Archived),
            other => Err(CompassError::Validation {
                message: format!("unknown instance status: {other}"),
            }),
        }
    }
}
