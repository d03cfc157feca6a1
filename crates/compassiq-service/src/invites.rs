//! Invite lifecycle — create, list, accept, revoke.
//!
//! The raw token leaves this module exactly once, in the creation
//! result; only its hash is stored. Acceptance needs no tenant context
//! (the invitee has no membership yet) and consumes the token in one
//! store transaction.

use chrono::{Duration, Utc};
use compassiq_core::context::TenantContext;
use compassiq_core::error::{CompassError, CompassResult};
use compassiq_core::gate;
use compassiq_core::models::invite::{CreateInvite, Invite, InviteStatus};
use compassiq_core::models::membership::Membership;
use compassiq_core::rbac::Role;
use compassiq_core::repository::{AuditLogRepository, InviteRepository};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::audit;
use crate::config::ServiceConfig;
use crate::token;

/// An invite with its status derived as of the listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListedInvite {
    #[serde(flatten)]
    pub invite: Invite,
    pub status: InviteStatus,
}

/// Result of creating an invite: the row plus the raw single-use token.
#[derive(Debug, Clone)]
pub struct CreatedInvite {
    pub invite: Invite,
    /// Returned exactly once; only the hash is stored.
    pub raw_token: String,
}

pub struct InviteService<V, L>
where
    V: InviteRepository,
    L: AuditLogRepository,
{
    invites: V,
    audit: L,
    config: ServiceConfig,
}

impl<V, L> InviteService<V, L>
where
    V: InviteRepository,
    L: AuditLogRepository,
{
    pub fn new(invites: V, audit: L, config: ServiceConfig) -> Self {
        Self {
            invites,
            audit,
            config,
        }
    }

    /// Create an invite. Inviting to OWNER requires OWNER.
    pub async fn create(
        &self,
        ctx: &TenantContext,
        email: &str,
        role: Role,
    ) -> CompassResult<CreatedInvite> {
        if let Err(err) = gate::ensure_can_mutate(ctx) {
            audit::denied(&self.audit, ctx, "invite.create").await;
            return Err(err);
        }
        if !ctx.role.can_assign(role) {
            audit::denied(&self.audit, ctx, "invite.create").await;
            return Err(CompassError::Forbidden);
        }

        let raw_token = token::generate_invite_token();
        let expires_at = Utc::now() + Duration::days(self.config.invite_expiry_days);

        let invite = self
            .invites
            .create(CreateInvite {
                org_id: ctx.org_id,
                email: email.to_string(),
                role,
                token_hash: token::hash_invite_token(&raw_token),
                expires_at,
            })
            .await?;

        info!(org_id = %ctx.org_id, email, role = %role, "created invite");
        audit::success(
            &self.audit,
            ctx,
            "invite.create",
            Some(invite.id),
            json!({ "email": email, "role": role.as_str() }),
        )
        .await;

        Ok(CreatedInvite { invite, raw_token })
    }

    /// All of the organization's invites with derived status.
    pub async fn list(&self, ctx: &TenantContext) -> CompassResult<Vec<ListedInvite>> {
        let now = Utc::now();
        let invites = self.invites.list(ctx.org_id).await?;
        Ok(invites
            .into_iter()
            .map(|invite| ListedInvite {
                status: invite.status_at(now),
                invite,
            })
            .collect())
    }

    /// Redeem a raw token and become a member.
    ///
    /// Unknown and already-used tokens are `NotFound`; expired tokens
    /// are `Conflict`. Runs without a tenant context.
    pub async fn accept(
        &self,
        raw_token: &str,
        principal: &str,
    ) -> CompassResult<(Invite, Membership)> {
        let hash = token::hash_invite_token(raw_token);
        let (invite, membership) = self.invites.accept(&hash, principal).await?;

        info!(org_id = %invite.org_id, principal, role = %invite.role, "invite accepted");

        Ok((invite, membership))
    }

    /// Revoke a pending invite.
    pub async fn revoke(&self, ctx: &TenantContext, invite_id: Uuid) -> CompassResult<()> {
        if let Err(err) = gate::ensure_can_mutate(ctx) {
            audit::denied(&self.audit, ctx, "invite.revoke").await;
            return Err(err);
        }

        // Scoped lookup first, so revoking another org's invite is
        // NotFound rather than a silent no-op.
        let invite = self.invites.get_by_id(ctx.org_id, invite_id).await?;
        self.invites.delete(ctx.org_id, invite.id).await?;

        audit::success(
            &self.audit,
            ctx,
            "invite.revoke",
            Some(invite.id),
            json!({ "email": invite.email }),
        )
        .await;

        Ok(())
    }
}
