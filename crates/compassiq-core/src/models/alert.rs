//! Alert domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CompassError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Lifecycle state. `open → {acknowledged, in_progress} → {resolved,
/// dismissed}` is the nominal path, but any state may be patched to any
/// other through the generic update — the machine is looser in practice
/// than a strict DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Open,
    Acknowledged,
    InProgress,
    Resolved,
    Dismissed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub org_id: Uuid,
    /// The instance whose publication produced this alert, if any.
    pub instance_id: Option<Uuid>,
    pub severity: AlertSeverity,
    pub alert_type: String,
    pub title: String,
    pub description: String,
    pub state: AlertState,
    /// Free-text identity (email). No referential integrity to
    /// memberships — assigning a non-member is legal.
    pub owner: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub disposition: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row to insert during publication fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub org_id: Uuid,
    pub instance_id: Option<Uuid>,
    pub severity: AlertSeverity,
    pub alert_type: String,
    pub title: String,
    pub description: String,
    pub state: AlertState,
    pub owner: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
}

/// Field-by-field patch for the generic alert update.
///
/// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAlert {
    pub state: Option<AlertState>,
    pub owner: Option<Option<String>>,
    pub due_at: Option<Option<DateTime<Utc>>>,
    pub disposition: Option<Option<String>>,
}

/// Read-side filters for alert listings.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub state: Option<AlertState>,
    pub severity: Option<AlertSeverity>,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl AlertState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertState::Open => "open",
            AlertState::Acknowledged => "acknowledged",
            AlertState::InProgress => "in_progress",
            AlertState::Resolved => "resolved",
            AlertState::Dismissed => "dismissed",
        }
    }

    /// Terminal states accept no further nominal transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AlertState::Resolved | AlertState::Dismissed)
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = CompassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(AlertSeverity::Low),
            "medium" => Ok(AlertSeverity::Medium),
            "high" => Ok(AlertSeverity::High),
            "critical" => Ok(AlertSeverity::Critical),
            other => Err(CompassError::Validation {
                message: format!("unknown alert severity: {other}"),
            }),
        }
    }
}

impl FromStr for AlertState {
    type Err = CompassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(AlertState::Open),
            "acknowledged" => Ok(AlertState::Acknowledged),
            "in_progress" => Ok(AlertState::InProgress),
            "resolved" => Ok(AlertState::Resolved),
            "dismissed" => Ok(AlertState::Dismissed),
            other => Err(CompassError::Validation {
                message: format!("unknown alert state: {other}"),
            }),
        }
    }
}
