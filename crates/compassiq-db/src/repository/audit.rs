//! SurrealDB implementation of [`AuditLogRepository`].

use compassiq_core::error::CompassResult;
use compassiq_core::models::audit::{AuditLogEntry, AuditOutcome, CreateAuditLogEntry};
use compassiq_core::repository::{AuditLogRepository, PaginatedResult, Pagination};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AuditRow {
    record_id: String,
    org_id: String,
    actor: String,
    action: String,
    entity_id: Option<String>,
    outcome: String,
    detail: serde_json::Value,
    timestamp: DateTime<Utc>,
}

impl AuditRow {
    fn try_into_entry(self) -> Result<AuditLogEntry, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        let org_id = Uuid::parse_str(&self.org_id)
            .map_err(|e| DbError::Query(format!("invalid org UUID: {e}")))?;
        let entity_id = self
            .entity_id
            .map(|s| Uuid::parse_str(&s))
            .transpose()
            .map_err(|e| DbError::Query(format!("invalid entity UUID: {e}")))?;
        let outcome = match self.outcome.as_str() {
            "success" => AuditOutcome::Success,
            "denied" => AuditOutcome::Denied,
            "failure" => AuditOutcome::Failure,
            other => {
                return Err(DbError::Query(format!("invalid stored outcome: {other}")));
            }
        };
        Ok(AuditLogEntry {
            id,
            org_id,
            actor: self.actor,
            action: self.action,
            entity_id,
            outcome,
            detail: self.detail,
            timestamp: self.timestamp,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

const AUDIT_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// SurrealDB implementation of the append-only audit log repository.
#[derive(Clone)]
pub struct SurrealAuditLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuditLogRepository for SurrealAuditLogRepository<C> {
    async fn append(&self, input: CreateAuditLogEntry) -> CompassResult<AuditLogEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 org_id = $org_id, actor = $actor, action = $action, \
                 entity_id = $entity_id, outcome = $outcome, \
                 detail = $detail",
            )
            .bind(("id", id_str.clone()))
            .bind(("org_id", input.org_id.to_string()))
            .bind(("actor", input.actor))
            .bind(("action", input.action))
            .bind(("entity_id", input.entity_id.map(|e| e.to_string())))
            .bind(("outcome", input.outcome.as_str()))
            .bind(("detail", input.detail))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| crate::error::map_throw(e, "audit_log", &id_str))?;

        let mut result = self
            .db
            .query(format!(
                "SELECT {AUDIT_PROJECTION} \
                 FROM type::record('audit_log', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "audit_log".into(),
            id: id_str,
        })?;

        Ok(row.try_into_entry()?)
    }

    async fn list(
        &self,
        org_id: Uuid,
        pagination: Pagination,
    ) -> CompassResult<PaginatedResult<AuditLogEntry>> {
        let org_str = org_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM audit_log \
                 WHERE org_id = $org_id GROUP ALL",
            )
            .bind(("org_id", org_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT {AUDIT_PROJECTION} FROM audit_log \
                 WHERE org_id = $org_id \
                 ORDER BY timestamp DESC \
                 LIMIT $limit START $offset"
            ))
            .bind(("org_id", org_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
