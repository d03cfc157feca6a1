//! Invite domain model.
//!
//! Invites carry a single-use token; only the token's SHA-256 hash is
//! stored. Status is derived at read time from `accepted_at` and
//! `expires_at` — never stored, so it cannot drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::rbac::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    pub id: Uuid,
    pub org_id: Uuid,
    pub email: String,
    /// The role granted on acceptance.
    pub role: Role,
    /// SHA-256 hex hash of the raw token. The raw value is returned
    /// exactly once, at creation.
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvite {
    pub org_id: Uuid,
    pub email: String,
    pub role: Role,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl Invite {
    /// Derive the invite status as of `now`.
    ///
    /// An accepted invite stays `accepted` even past its expiry.
    pub fn status_at(&self, now: DateTime<Utc>) -> InviteStatus {
        if self.accepted_at.is_some() {
            InviteStatus::Accepted
        } else if self.expires_at <= now {
            InviteStatus::Expired
        } else {
            InviteStatus::Pending
        }
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(expires_in: Duration, accepted: bool) -> Invite {
        let now = Utc::now();
        Invite {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            email: "new.hire@example.com".into(),
            role: Role::Viewer,
            token_hash: "abc123".into(),
            created_at: now,
            expires_at: now + expires_in,
            accepted_at: accepted.then_some(now),
        }
    }

    #[test]
    fn unaccepted_past_expiry_is_expired() {
        let inv = invite(Duration::days(-1), false);
        assert_eq!(inv.status_at(Utc::now()), InviteStatus::Expired);
    }

    #[test]
    fn accepted_wins_regardless_of_expiry() {
        let inv = invite(Duration::days(-1), true);
        assert_eq!(inv.status_at(Utc::now()), InviteStatus::Accepted);
    }

    #[test]
    fn otherwise_pending() {
        let inv = invite(Duration::days(7), false);
        assert_eq!(inv.status_at(Utc::now()), InviteStatus::Pending);
    }
}
