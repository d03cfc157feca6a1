//! Membership management.
//!
//! Role changes and removals are gate-checked here; the last-OWNER
//! invariant itself is enforced inside the store transaction so racing
//! admins cannot both pass the count check.

use compassiq_core::context::TenantContext;
use compassiq_core::error::{CompassError, CompassResult};
use compassiq_core::gate;
use compassiq_core::models::membership::{CreateMembership, Membership};
use compassiq_core::rbac::Role;
use compassiq_core::repository::{AuditLogRepository, MembershipRepository, PaginatedResult, Pagination};
use serde_json::json;
use tracing::info;

use crate::audit;

pub struct MemberService<M, L>
where
    M: MembershipRepository,
    L: AuditLogRepository,
{
    members: M,
    audit: L,
}

impl<M, L> MemberService<M, L>
where
    M: MembershipRepository,
    L: AuditLogRepository,
{
    pub fn new(members: M, audit: L) -> Self {
        Self { members, audit }
    }

    /// Any member may read the roster.
    pub async fn list(
        &self,
        ctx: &TenantContext,
        pagination: Pagination,
    ) -> CompassResult<PaginatedResult<Membership>> {
        self.members.list(ctx.org_id, pagination).await
    }

    /// Add a member directly (without an invite).
    pub async fn add(
        &self,
        ctx: &TenantContext,
        principal: &str,
        role: Role,
    ) -> CompassResult<Membership> {
        if let Err(err) = gate::ensure_can_mutate(ctx) {
            audit::denied(&self.audit, ctx, "member.add").await;
            return Err(err);
        }
        if !ctx.role.can_assign(role) {
            audit::denied(&self.audit, ctx, "member.add").await;
            return Err(CompassError::Forbidden);
        }

        let membership = self
            .members
            .create(CreateMembership {
                org_id: ctx.org_id,
                principal: principal.to_string(),
                role,
            })
            .await?;

        info!(org_id = %ctx.org_id, principal, role = %role, "added member");
        audit::success(
            &self.audit,
            ctx,
            "member.add",
            Some(membership.id),
            json!({ "principal": principal, "role": role.as_str() }),
        )
        .await;

        Ok(membership)
    }

    /// Change a member's role.
    ///
    /// Granting OWNER, or changing an existing OWNER to anything else,
    /// requires the caller to be OWNER. Demoting the last OWNER fails
    /// `Conflict` in the store.
    pub async fn change_role(
        &self,
        ctx: &TenantContext,
        principal: &str,
        new_role: Role,
    ) -> CompassResult<Membership> {
        if let Err(err) = gate::ensure_can_mutate(ctx) {
            audit::denied(&self.audit, ctx, "member.change_role").await;
            return Err(err);
        }

        let current = self.members.get(ctx.org_id, principal).await?;
        let touches_owner = current.role == Role::Owner || new_role == Role::Owner;
        if touches_owner && !ctx.role.can_assign(Role::Owner) {
            audit::denied(&self.audit, ctx, "member.change_role").await;
            return Err(CompassError::Forbidden);
        }
        if !ctx.role.can_assign(new_role) {
            audit::denied(&self.audit, ctx, "member.change_role").await;
            return Err(CompassError::Forbidden);
        }

        let membership = self
            .members
            .update_role(ctx.org_id, principal, new_role)
            .await?;

        info!(org_id = %ctx.org_id, principal, from = %current.role, to = %new_role, "changed member role");
        audit::success(
            &self.audit,
            ctx,
            "member.change_role",
            Some(membership.id),
            json!({
                "principal": principal,
                "from": current.role.as_str(),
                "to": new_role.as_str(),
            }),
        )
        .await;

        Ok(membership)
    }

    /// Remove a member. Removing an OWNER requires OWNER; removing the
    /// last OWNER fails `Conflict` in the store.
    pub async fn remove(&self, ctx: &TenantContext, principal: &str) -> CompassResult<()> {
        if let Err(err) = gate::ensure_can_mutate(ctx) {
            audit::denied(&self.audit, ctx, "member.remove").await;
            return Err(err);
        }

        let current = self.members.get(ctx.org_id, principal).await?;
        if current.role == Role::Owner && !ctx.role.can_assign(Role::Owner) {
            audit::denied(&self.audit, ctx, "member.remove").await;
            return Err(CompassError::Forbidden);
        }

        self.members.remove(ctx.org_id, principal).await?;

        info!(org_id = %ctx.org_id, principal, "removed member");
        audit::success(
            &self.audit,
            ctx,
            "member.remove",
            None,
            json!({ "principal": principal }),
        )
        .await;

        Ok(())
    }
}
