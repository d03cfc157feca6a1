//! SurrealDB implementation of [`CadenceItemRepository`].
//!
//! Cadence items are written only by the publish transaction (see the
//! instance repository); this side is read-only.

use compassiq_core::error::CompassResult;
use compassiq_core::models::cadence_item::CadenceItem;
use compassiq_core::repository::CadenceItemRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CadenceItemRow {
    record_id: String,
    org_id: String,
    instance_id: String,
    cadence: String,
    title: String,
    rules: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl CadenceItemRow {
    fn try_into_item(self) -> Result<CadenceItem, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        let org_id = Uuid::parse_str(&self.org_id)
            .map_err(|e| DbError::Query(format!("invalid org UUID: {e}")))?;
        let instance_id = Uuid::parse_str(&self.instance_id)
            .map_err(|e| DbError::Query(format!("invalid instance UUID: {e}")))?;
        Ok(CadenceItem {
            id,
            org_id,
            instance_id,
            cadence: self.cadence,
            title: self.title,
            rules: self.rules,
            created_at: self.created_at,
        })
    }
}

const CADENCE_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// SurrealDB implementation of the CadenceItem repository.
#[derive(Clone)]
pub struct SurrealCadenceItemRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCadenceItemRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CadenceItemRepository for SurrealCadenceItemRepository<C> {
    async fn list_by_instance(
        &self,
        org_id: Uuid,
        instance_id: Uuid,
    ) -> CompassResult<Vec<CadenceItem>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {CADENCE_PROJECTION} FROM cadence_item \
                 WHERE org_id = $org_id AND instance_id = $instance_id \
                 ORDER BY created_at ASC"
            ))
            .bind(("org_id", org_id.to_string()))
            .bind(("instance_id", instance_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CadenceItemRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_item())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn list(&self, org_id: Uuid) -> CompassResult<Vec<CadenceItem>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {CADENCE_PROJECTION} FROM cadence_item \
                 WHERE org_id = $org_id \
                 ORDER BY created_at ASC"
            ))
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CadenceItemRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_item())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }
}
