//! Alert lifecycle operations.
//!
//! One generic patch operation covers state transitions, assignment,
//! due dates, and disposition notes. "Assign to me" and "due +7 days"
//! are client-side conveniences that compute a value and call the same
//! update — they are not distinct server operations.

use compassiq_core::context::TenantContext;
use compassiq_core::error::CompassResult;
use compassiq_core::gate;
use compassiq_core::models::alert::{Alert, AlertFilter, UpdateAlert};
use compassiq_core::repository::{AlertRepository, AuditLogRepository, PaginatedResult, Pagination};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::audit;

pub struct AlertService<A, L>
where
    A: AlertRepository,
    L: AuditLogRepository,
{
    alerts: A,
    audit: L,
}

impl<A, L> AlertService<A, L>
where
    A: AlertRepository,
    L: AuditLogRepository,
{
    pub fn new(alerts: A, audit: L) -> Self {
        Self { alerts, audit }
    }

    /// Filtered listing, newest first. Any member may read.
    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: AlertFilter,
        pagination: Pagination,
    ) -> CompassResult<PaginatedResult<Alert>> {
        self.alerts.list(ctx.org_id, filter, pagination).await
    }

    pub async fn get(&self, ctx: &TenantContext, alert_id: Uuid) -> CompassResult<Alert> {
        self.alerts.get_by_id(ctx.org_id, alert_id).await
    }

    /// Patch an alert field-by-field.
    ///
    /// `NotFound` when the alert does not belong to the context's
    /// organization. No side effects beyond the row mutation.
    pub async fn update(
        &self,
        ctx: &TenantContext,
        alert_id: Uuid,
        patch: UpdateAlert,
    ) -> CompassResult<Alert> {
        if let Err(err) = gate::ensure_can_mutate(ctx) {
            audit::denied(&self.audit, ctx, "alert.update").await;
            return Err(err);
        }

        let changed: Vec<&str> = [
            patch.state.is_some().then_some("state"),
            patch.owner.is_some().then_some("owner"),
            patch.due_at.is_some().then_some("due_at"),
            patch.disposition.is_some().then_some("disposition"),
        ]
        .into_iter()
        .flatten()
        .collect();

        let alert = self.alerts.update(ctx.org_id, alert_id, patch).await?;

        info!(org_id = %ctx.org_id, alert_id = %alert.id, ?changed, "updated alert");
        audit::success(
            &self.audit,
            ctx,
            "alert.update",
            Some(alert.id),
            json!({ "fields": changed }),
        )
        .await;

        Ok(alert)
    }
}
