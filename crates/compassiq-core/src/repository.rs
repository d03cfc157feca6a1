//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Org-scoped repositories take an
//! `org_id` parameter on every read and write to enforce tenant
//! isolation — a row belonging to another organization is `NotFound`,
//! not `Forbidden`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CompassResult;
use crate::fanout::FanoutRows;
use crate::models::{
    alert::{Alert, AlertFilter, UpdateAlert},
    audit::{AuditLogEntry, CreateAuditLogEntry},
    cadence_item::CadenceItem,
    instance::{CreateInstance, Instance},
    invite::{CreateInvite, Invite},
    membership::{CreateMembership, Membership},
    organization::{CreateOrganization, Organization, UpdateOrganization},
    template::{CreateTemplate, Template},
};
use crate::rbac::Role;

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Organizations & memberships
// ---------------------------------------------------------------------------

pub trait OrganizationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = CompassResult<Organization>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CompassResult<Organization>> + Send;
    fn get_by_slug(&self, slug: &str)
    -> impl Future<Output = CompassResult<Organization>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> impl Future<Output = CompassResult<Organization>> + Send;
    /// Deletes the organization and every row scoped to it.
    fn delete(&self, id: Uuid) -> impl Future<Output = CompassResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = CompassResult<PaginatedResult<Organization>>> + Send;
}

pub trait MembershipRepository: Send + Sync {
    fn create(
        &self,
        input: CreateMembership,
    ) -> impl Future<Output = CompassResult<Membership>> + Send;
    fn get(
        &self,
        org_id: Uuid,
        principal: &str,
    ) -> impl Future<Output = CompassResult<Membership>> + Send;
    fn list(
        &self,
        org_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CompassResult<PaginatedResult<Membership>>> + Send;

    /// Change a member's role.
    ///
    /// Demoting the organization's last OWNER fails `Conflict`; the
    /// count check and the write happen in one store transaction.
    fn update_role(
        &self,
        org_id: Uuid,
        principal: &str,
        role: Role,
    ) -> impl Future<Output = CompassResult<Membership>> + Send;

    /// Remove a member. Removing the last OWNER fails `Conflict`,
    /// enforced atomically as above.
    fn remove(
        &self,
        org_id: Uuid,
        principal: &str,
    ) -> impl Future<Output = CompassResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Template catalog (shared, not tenant-scoped)
// ---------------------------------------------------------------------------

pub trait TemplateRepository: Send + Sync {
    fn create(&self, input: CreateTemplate)
    -> impl Future<Output = CompassResult<Template>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CompassResult<Template>> + Send;
    fn get_by_key(&self, key: &str) -> impl Future<Output = CompassResult<Template>> + Send;
    /// The full catalog, ordered by key.
    fn list(&self) -> impl Future<Output = CompassResult<Vec<Template>>> + Send;
}

// ---------------------------------------------------------------------------
// Instances & fan-out output
// ---------------------------------------------------------------------------

pub trait InstanceRepository: Send + Sync {
    fn create(&self, input: CreateInstance)
    -> impl Future<Output = CompassResult<Instance>> + Send;
    fn get_by_id(
        &self,
        org_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = CompassResult<Instance>> + Send;
    /// All of the organization's instances, newest first.
    fn list(&self, org_id: Uuid) -> impl Future<Output = CompassResult<Vec<Instance>>> + Send;

    /// The draft→published transition plus the full fan-out insertion,
    /// as one atomic unit of work.
    ///
    /// Fails `Conflict` when the instance is not `draft`; any fan-out
    /// insertion failure aborts the whole transaction, leaving the
    /// instance draft with zero rows inserted.
    fn publish(
        &self,
        org_id: Uuid,
        id: Uuid,
        published_at: DateTime<Utc>,
        rows: FanoutRows,
    ) -> impl Future<Output = CompassResult<Instance>> + Send;

    /// The published→archived transition. Fails `Conflict` from any
    /// other status.
    fn archive(
        &self,
        org_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = CompassResult<Instance>> + Send;
}

pub trait AlertRepository: Send + Sync {
    fn get_by_id(&self, org_id: Uuid, id: Uuid)
    -> impl Future<Output = CompassResult<Alert>> + Send;
    /// Filtered listing, newest first.
    fn list(
        &self,
        org_id: Uuid,
        filter: AlertFilter,
        pagination: Pagination,
    ) -> impl Future<Output = CompassResult<PaginatedResult<Alert>>> + Send;
    fn list_by_instance(
        &self,
        org_id: Uuid,
        instance_id: Uuid,
    ) -> impl Future<Output = CompassResult<Vec<Alert>>> + Send;
    /// Generic field-by-field patch; the single mutation path for
    /// state, owner, due date, and disposition.
    fn update(
        &self,
        org_id: Uuid,
        id: Uuid,
        patch: UpdateAlert,
    ) -> impl Future<Output = CompassResult<Alert>> + Send;
}

pub trait CadenceItemRepository: Send + Sync {
    fn list_by_instance(
        &self,
        org_id: Uuid,
        instance_id: Uuid,
    ) -> impl Future<Output = CompassResult<Vec<CadenceItem>>> + Send;
    fn list(&self, org_id: Uuid) -> impl Future<Output = CompassResult<Vec<CadenceItem>>> + Send;
}

// ---------------------------------------------------------------------------
// Invites
// ---------------------------------------------------------------------------

pub trait InviteRepository: Send + Sync {
    fn create(&self, input: CreateInvite) -> impl Future<Output = CompassResult<Invite>> + Send;
    fn get_by_id(
        &self,
        org_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = CompassResult<Invite>> + Send;
    fn list(&self, org_id: Uuid) -> impl Future<Output = CompassResult<Vec<Invite>>> + Send;

    /// Consume an invite by raw-token hash and create the membership,
    /// in one transaction (single-use guarantee).
    ///
    /// Unknown or already-used tokens are `NotFound`; expired tokens
    /// are `Conflict`.
    fn accept(
        &self,
        token_hash: &str,
        principal: &str,
    ) -> impl Future<Output = CompassResult<(Invite, Membership)>> + Send;

    fn delete(&self, org_id: Uuid, id: Uuid) -> impl Future<Output = CompassResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Audit (append-only)
// ---------------------------------------------------------------------------

pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit log entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditLogEntry,
    ) -> impl Future<Output = CompassResult<AuditLogEntry>> + Send;
    fn list(
        &self,
        org_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CompassResult<PaginatedResult<AuditLogEntry>>> + Send;
}
