//! Best-effort audit trail helpers.
//!
//! Audit writes never fail an operation: a mutation that succeeded
//! stays succeeded even if its trail entry cannot be appended. Failed
//! appends are logged and dropped.

use compassiq_core::context::TenantContext;
use compassiq_core::models::audit::{AuditOutcome, CreateAuditLogEntry};
use compassiq_core::repository::AuditLogRepository;
use tracing::warn;
use uuid::Uuid;

pub(crate) async fn record<L: AuditLogRepository>(
    audit: &L,
    ctx: &TenantContext,
    action: &str,
    entity_id: Option<Uuid>,
    outcome: AuditOutcome,
    detail: serde_json::Value,
) {
    let entry = CreateAuditLogEntry {
        org_id: ctx.org_id,
        actor: ctx.principal.clone(),
        action: action.to_string(),
        entity_id,
        outcome,
        detail,
    };
    if let Err(e) = audit.append(entry).await {
        warn!(action, error = %e, "failed to append audit log entry");
    }
}

pub(crate) async fn success<L: AuditLogRepository>(
    audit: &L,
    ctx: &TenantContext,
    action: &str,
    entity_id: Option<Uuid>,
    detail: serde_json::Value,
) {
    record(audit, ctx, action, entity_id, AuditOutcome::Success, detail).await;
}

pub(crate) async fn denied<L: AuditLogRepository>(audit: &L, ctx: &TenantContext, action: &str) {
    record(
        audit,
        ctx,
        action,
        None,
        AuditOutcome::Denied,
        serde_json::Value::Object(Default::default()),
    )
    .await;
}
