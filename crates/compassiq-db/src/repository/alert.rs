//! SurrealDB implementation of [`AlertRepository`].

use compassiq_core::error::CompassResult;
use compassiq_core::models::alert::{Alert, AlertFilter, AlertSeverity, AlertState, UpdateAlert};
use compassiq_core::repository::{AlertRepository, PaginatedResult, Pagination};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AlertRow {
    record_id: String,
    org_id: String,
    instance_id: Option<String>,
    severity: String,
    alert_type: String,
    title: String,
    description: String,
    state: String,
    owner: Option<String>,
    due_at: Option<DateTime<Utc>>,
    disposition: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AlertRow {
    fn try_into_alert(self) -> Result<Alert, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        let org_id = Uuid::parse_str(&self.org_id)
            .map_err(|e| DbError::Query(format!("invalid org UUID: {e}")))?;
        let instance_id = self
            .instance_id
            .map(|s| Uuid::parse_str(&s))
            .transpose()
            .map_err(|e| DbError::Query(format!("invalid instance UUID: {e}")))?;
        let severity: AlertSeverity = self
            .severity
            .parse()
            .map_err(|_| DbError::Query(format!("invalid stored severity: {}", self.severity)))?;
        let state: AlertState = self
            .state
            .parse()
            .map_err(|_| DbError::Query(format!("invalid stored state: {}", self.state)))?;
        Ok(Alert {
            id,
            org_id,
            instance_id,
            severity,
            alert_type: self.alert_type,
            title: self.title,
            description: self.description,
            state,
            owner: self.owner,
            due_at: self.due_at,
            disposition: self.disposition,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for UPDATE results, where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct AlertRowBare {
    org_id: String,
    instance_id: Option<String>,
    severity: String,
    alert_type: String,
    title: String,
    description: String,
    state: String,
    owner: Option<String>,
    due_at: Option<DateTime<Utc>>,
    disposition: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AlertRowBare {
    fn with_id(self, record_id: String) -> AlertRow {
        AlertRow {
            record_id,
            org_id: self.org_id,
            instance_id: self.instance_id,
            severity: self.severity,
            alert_type: self.alert_type,
            title: self.title,
            description: self.description,
            state: self.state,
            owner: self.owner,
            due_at: self.due_at,
            disposition: self.disposition,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

const ALERT_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// SurrealDB implementation of the Alert repository.
#[derive(Clone)]
pub struct SurrealAlertRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAlertRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AlertRepository for SurrealAlertRepository<C> {
    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> CompassResult<Alert> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!(
                "SELECT {ALERT_PROJECTION} \
                 FROM type::record('alert', $id) \
                 WHERE org_id = $org_id"
            ))
            .bind(("id", id_str.clone()))
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AlertRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "alert".into(),
            id: id_str,
        })?;

        Ok(row.try_into_alert()?)
    }

    async fn list(
        &self,
        org_id: Uuid,
        filter: AlertFilter,
        pagination: Pagination,
    ) -> CompassResult<PaginatedResult<Alert>> {
        let org_str = org_id.to_string();

        let mut conditions = vec!["org_id = $org_id"];
        if filter.state.is_some() {
            conditions.push("state = $state");
        }
        if filter.severity.is_some() {
            conditions.push("severity = $severity");
        }
        let where_clause = conditions.join(" AND ");

        let count_query = format!(
            "SELECT count() AS total FROM alert WHERE {where_clause} GROUP ALL"
        );
        let mut count_builder = self.db.query(&count_query).bind(("org_id", org_str.clone()));
        if let Some(state) = filter.state {
            count_builder = count_builder.bind(("state", state.as_str()));
        }
        if let Some(severity) = filter.severity {
            count_builder = count_builder.bind(("severity", severity.as_str()));
        }
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let query = format!(
            "SELECT {ALERT_PROJECTION} FROM alert \
             WHERE {where_clause} \
             ORDER BY created_at DESC \
             LIMIT $limit START $offset"
        );
        let mut builder = self
            .db
            .query(&query)
            .bind(("org_id", org_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(state) = filter.state {
            builder = builder.bind(("state", state.as_str()));
        }
        if let Some(severity) = filter.severity {
            builder = builder.bind(("severity", severity.as_str()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<AlertRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_alert())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_by_instance(
        &self,
        org_id: Uuid,
        instance_id: Uuid,
    ) -> CompassResult<Vec<Alert>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {ALERT_PROJECTION} FROM alert \
                 WHERE org_id = $org_id AND instance_id = $instance_id \
                 ORDER BY created_at ASC"
            ))
            .bind(("org_id", org_id.to_string()))
            .bind(("instance_id", instance_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AlertRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_alert())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn update(&self, org_id: Uuid, id: Uuid, patch: UpdateAlert) -> CompassResult<Alert> {
        let id_str = id.to_string();

        // `Some(None)` clears a field (binds NULL → NONE); absent
        // fields are left untouched.
        let mut sets = Vec::new();
        if patch.state.is_some() {
            sets.push("state = $state");
        }
        if patch.owner.is_some() {
            sets.push("owner = $owner");
        }
        if patch.due_at.is_some() {
            sets.push("due_at = $due_at");
        }
        if patch.disposition.is_some() {
            sets.push("disposition = $disposition");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('alert', $id) SET {} \
             WHERE org_id = $org_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("org_id", org_id.to_string()));

        if let Some(state) = patch.state {
            builder = builder.bind(("state", state.as_str()));
        }
        if let Some(owner) = patch.owner {
            builder = builder.bind(("owner", owner));
        }
        if let Some(due_at) = patch.due_at {
            builder = builder.bind(("due_at", due_at));
        }
        if let Some(disposition) = patch.disposition {
            builder = builder.bind(("disposition", disposition));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| crate::error::map_throw(e, "alert", &id_str))?;

        // An org mismatch filters the UPDATE down to zero rows.
        let rows: Vec<AlertRowBare> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "alert".into(),
            id: id_str.clone(),
        })?;

        Ok(row.with_id(id_str).try_into_alert()?)
    }
}
