//! Role model and capability table.
//!
//! Roles are a closed enumeration; permission checks are lookups into
//! a static capability table rather than scattered string comparisons.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CompassError;

/// A member's role within one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Admin,
    Finance,
    Ops,
    Sales,
    Viewer,
}

/// What a role is allowed to do. Write discipline is coarse: the admin
/// roles mutate tenant data, OWNER additionally controls ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create/publish instances, update alerts, manage non-OWNER members.
    MutateTenantData,
    /// Invite, remove, and re-role members (below OWNER).
    ManageMembers,
    /// Grant or revoke the OWNER role.
    AssignOwner,
}

static CAPABILITY_TABLE: &[(Role, &[Capability])] = &[
    (
        Role::Owner,
        &[
            Capability::MutateTenantData,
            Capability::ManageMembers,
            Capability::AssignOwner,
        ],
    ),
    (
        Role::Admin,
        &[Capability::MutateTenantData, Capability::ManageMembers],
    ),
    (Role::Finance, &[]),
    (Role::Ops, &[]),
    (Role::Sales, &[]),
    (Role::Viewer, &[]),
];

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Owner,
        Role::Admin,
        Role::Finance,
        Role::Ops,
        Role::Sales,
        Role::Viewer,
    ];

    /// The stored string form (matches the schema ASSERT list).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Admin => "ADMIN",
            Role::Finance => "FINANCE",
            Role::Ops => "OPS",
            Role::Sales => "SALES",
            Role::Viewer => "VIEWER",
        }
    }

    pub fn has_capability(&self, cap: Capability) -> bool {
        CAPABILITY_TABLE
            .iter()
            .find(|(role, _)| role == self)
            .is_some_and(|(_, caps)| caps.contains(&cap))
    }

    /// `role ∈ {OWNER, ADMIN}`.
    pub fn is_admin(&self) -> bool {
        self.has_capability(Capability::MutateTenantData)
    }

    /// Whether this role may assign or revoke `target` on another member.
    /// Only OWNER may grant or revoke OWNER.
    pub fn can_assign(&self, target: Role) -> bool {
        if target == Role::Owner {
            self.has_capability(Capability::AssignOwner)
        } else {
            self.has_capability(Capability::ManageMembers)
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CompassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OWNER" => Ok(Role::Owner),
            "ADMIN" => Ok(Role::Admin),
            "FINANCE" => Ok(Role::Finance),
            "OPS" => Ok(Role::Ops),
            "SALES" => Ok(Role::Sales),
            "VIEWER" => Ok(Role::Viewer),
            other => Err(CompassError::Validation {
                message: format!("unknown role: {other}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_owner_and_admin_are_admins() {
        assert!(Role::Owner.is_admin());
        assert!(Role::Admin.is_admin());
        for role in [Role::Finance, Role::Ops, Role::Sales, Role::Viewer] {
            assert!(!role.is_admin(), "{role} must not be admin");
        }
    }

    #[test]
    fn only_owner_assigns_owner() {
        assert!(Role::Owner.can_assign(Role::Owner));
        assert!(!Role::Admin.can_assign(Role::Owner));
        assert!(Role::Admin.can_assign(Role::Viewer));
        assert!(!Role::Viewer.can_assign(Role::Viewer));
    }

    #[test]
    fn role_string_roundtrip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("SUPERUSER".parse::<Role>().is_err());
    }
}
