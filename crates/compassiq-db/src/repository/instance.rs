//! SurrealDB implementation of [`InstanceRepository`].
//!
//! `publish` is the one correctness-sensitive operation in the system:
//! the draft check, the status flip, and the full fan-out insertion run
//! in a single transaction. A non-draft instance THROWs before any
//! write; a failed insert rolls the status flip back. No published
//! instance can exist with partial fan-out.

use compassiq_core::error::CompassResult;
use compassiq_core::fanout::FanoutRows;
use compassiq_core::models::instance::{CreateInstance, Instance, InstanceStatus};
use compassiq_core::repository::InstanceRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct InstanceRow {
    record_id: String,
    org_id: String,
    template_id: String,
    name: String,
    status: String,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InstanceRow {
    fn try_into_instance(self) -> Result<Instance, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        let org_id = Uuid::parse_str(&self.org_id)
            .map_err(|e| DbError::Query(format!("invalid org UUID: {e}")))?;
        let template_id = Uuid::parse_str(&self.template_id)
            .map_err(|e| DbError::Query(format!("invalid template UUID: {e}")))?;
        let status: InstanceStatus = self
            .status
            .parse()
            .map_err(|_| DbError::Query(format!("invalid stored status: {}", self.status)))?;
        Ok(Instance {
            id,
            org_id,
            template_id,
            name: self.name,
            status,
            published_at: self.published_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// One fan-out row staged for insertion inside the publish transaction.
#[derive(Debug, SurrealValue)]
struct AlertInsert {
    id: String,
    data: AlertInsertData,
}

#[derive(Debug, SurrealValue)]
struct AlertInsertData {
    org_id: String,
    instance_id: Option<String>,
    severity: String,
    alert_type: String,
    title: String,
    description: String,
    state: String,
    owner: Option<String>,
    due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, SurrealValue)]
struct CadenceInsert {
    id: String,
    data: CadenceInsertData,
}

#[derive(Debug, SurrealValue)]
struct CadenceInsertData {
    org_id: String,
    instance_id: String,
    cadence: String,
    title: String,
    rules: serde_json::Value,
}

const INSTANCE_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// SurrealDB implementation of the Instance repository.
#[derive(Clone)]
pub struct SurrealInstanceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInstanceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> InstanceRepository for SurrealInstanceRepository<C> {
    async fn create(&self, input: CreateInstance) -> CompassResult<Instance> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('instance', $id) SET \
                 org_id = $org_id, template_id = $template_id, \
                 name = $name, status = 'draft'",
            )
            .bind(("id", id_str.clone()))
            .bind(("org_id", input.org_id.to_string()))
            .bind(("template_id", input.template_id.to_string()))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| crate::error::map_throw(e, "instance", &id_str))?;

        self.get_by_id(input.org_id, id).await
    }

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> CompassResult<Instance> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!(
                "SELECT {INSTANCE_PROJECTION} \
                 FROM type::record('instance', $id) \
                 WHERE org_id = $org_id"
            ))
            .bind(("id", id_str.clone()))
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InstanceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "instance".into(),
            id: id_str,
        })?;

        Ok(row.try_into_instance()?)
    }

    async fn list(&self, org_id: Uuid) -> CompassResult<Vec<Instance>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {INSTANCE_PROJECTION} FROM instance \
                 WHERE org_id = $org_id \
                 ORDER BY created_at DESC"
            ))
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InstanceRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_instance())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn publish(
        &self,
        org_id: Uuid,
        id: Uuid,
        published_at: DateTime<Utc>,
        rows: FanoutRows,
    ) -> CompassResult<Instance> {
        let id_str = id.to_string();

        let alerts: Vec<AlertInsert> = rows
            .alerts
            .into_iter()
            .map(|a| AlertInsert {
                id: Uuid::new_v4().to_string(),
                data: AlertInsertData {
                    org_id: a.org_id.to_string(),
                    instance_id: a.instance_id.map(|i| i.to_string()),
                    severity: a.severity.as_str().into(),
                    alert_type: a.alert_type,
                    title: a.title,
                    description: a.description,
                    state: a.state.as_str().into(),
                    owner: a.owner,
                    due_at: a.due_at,
                },
            })
            .collect();

        let items: Vec<CadenceInsert> = rows
            .cadence_items
            .into_iter()
            .map(|c| CadenceInsert {
                id: Uuid::new_v4().to_string(),
                data: CadenceInsertData {
                    org_id: c.org_id.to_string(),
                    instance_id: c.instance_id.to_string(),
                    cadence: c.cadence,
                    title: c.title,
                    rules: c.rules,
                },
            })
            .collect();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $inst = (SELECT * FROM type::record('instance', $id) \
                     WHERE org_id = $org_id); \
                 IF array::len($inst) == 0 { THROW 'instance_not_found' }; \
                 IF $inst[0].status != 'draft' { THROW 'instance_not_draft' }; \
                 UPDATE type::record('instance', $id) SET \
                     status = 'published', \
                     published_at = $published_at, \
                     updated_at = time::now(); \
                 FOR $row IN $alerts { \
                     CREATE type::record('alert', $row.id) CONTENT $row.data; \
                 }; \
                 FOR $row IN $items { \
                     CREATE type::record('cadence_item', $row.id) \
                         CONTENT $row.data; \
                 }; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .bind(("org_id", org_id.to_string()))
            .bind(("published_at", published_at))
            .bind(("alerts", alerts))
            .bind(("items", items))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| crate::error::map_throw(e, "instance", &id_str))?;

        self.get_by_id(org_id, id).await
    }

    async fn archive(&self, org_id: Uuid, id: Uuid) -> CompassResult<Instance> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $inst = (SELECT * FROM type::record('instance', $id) \
                     WHERE org_id = $org_id); \
                 IF array::len($inst) == 0 { THROW 'instance_not_found' }; \
                 IF $inst[0].status != 'published' { \
                     THROW 'instance_not_published' }; \
                 UPDATE type::record('instance', $id) SET \
                     status = 'archived', updated_at = time::now(); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| crate::error::map_throw(e, "instance", &id_str))?;

        self.get_by_id(org_id, id).await
    }
}
