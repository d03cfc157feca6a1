//! Org context resolution.
//!
//! Turns (session principal, active-org selection) into a
//! [`TenantContext`]. Absent context is not an error — every caller
//! treats `None` as "not authorized for anything tenant-scoped".

use compassiq_core::context::TenantContext;
use compassiq_core::error::{CompassError, CompassResult};
use compassiq_core::repository::{MembershipRepository, OrganizationRepository};
use tracing::debug;
use uuid::Uuid;

use crate::config::ServiceConfig;

/// Resolves the active tenant, the principal's role within it, and the
/// tenant's demo flag.
pub struct OrgContextService<O: OrganizationRepository, M: MembershipRepository> {
    orgs: O,
    members: M,
    config: ServiceConfig,
}

impl<O: OrganizationRepository, M: MembershipRepository> OrgContextService<O, M> {
    pub fn new(orgs: O, members: M, config: ServiceConfig) -> Self {
        Self {
            orgs,
            members,
            config,
        }
    }

    /// Resolve a tenant context for one operation.
    ///
    /// Returns `Ok(None)` when there is no principal (and no dev
    /// bypass), no active-org selection, the organization does not
    /// exist, or the principal holds no membership in it. Store
    /// failures still surface as errors.
    pub async fn resolve(
        &self,
        principal: Option<&str>,
        org_id: Option<Uuid>,
    ) -> CompassResult<Option<TenantContext>> {
        // 1. Identify the principal — session first, dev bypass second.
        let Some(principal) = principal
            .map(str::to_string)
            .or_else(|| self.config.dev_principal.clone())
        else {
            return Ok(None);
        };

        // 2. An operation without an active-org selection is unscoped.
        let Some(org_id) = org_id else {
            return Ok(None);
        };

        // 3. Organization lookup.
        let org = match self.orgs.get_by_id(org_id).await {
            Ok(org) => org,
            Err(CompassError::NotFound { .. }) => {
                debug!(%org_id, "active-org selection points at no organization");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        // 4. Membership lookup.
        let membership = match self.members.get(org_id, &principal).await {
            Ok(m) => m,
            Err(CompassError::NotFound { .. }) => {
                debug!(%org_id, principal, "principal is not a member");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        Ok(Some(TenantContext::new(
            org_id,
            principal,
            membership.role,
            org.is_demo,
        )))
    }

    /// Resolve by organization slug instead of id.
    pub async fn resolve_by_slug(
        &self,
        principal: Option<&str>,
        slug: &str,
    ) -> CompassResult<Option<TenantContext>> {
        let org = match self.orgs.get_by_slug(slug).await {
            Ok(org) => org,
            Err(CompassError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        self.resolve(principal, Some(org.id)).await
    }
}
