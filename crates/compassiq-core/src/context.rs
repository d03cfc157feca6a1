//! Request-scoped tenant context.
//!
//! A `TenantContext` is an explicit value resolved once per operation
//! and passed through every call — nothing reads ambient per-request
//! state, so cross-request leakage is impossible by construction.

use uuid::Uuid;

use crate::rbac::Role;

/// The resolved identity of one principal acting inside one
/// organization for the duration of a single operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    /// The active organization.
    pub org_id: Uuid,
    /// The acting identity (email).
    pub principal: String,
    /// The principal's role within `org_id`.
    pub role: Role,
    /// Demo organizations are read-only regardless of role.
    pub is_demo: bool,
}

impl TenantContext {
    pub fn new(org_id: Uuid, principal: impl Into<String>, role: Role, is_demo: bool) -> Self {
        Self {
            org_id,
            principal: principal.into(),
            role,
            is_demo,
        }
    }

    /// `role ∈ {OWNER, ADMIN}`.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
