//! SurrealDB implementation of [`TemplateRepository`].
//!
//! Templates are shared catalog data — no org scoping. Bodies are
//! stored opaquely; parsing and validation happen in the catalog.

use compassiq_core::error::CompassResult;
use compassiq_core::models::template::{CreateTemplate, Template};
use compassiq_core::repository::TemplateRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct TemplateRow {
    record_id: String,
    key: String,
    name: String,
    description: String,
    version: u32,
    body: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TemplateRow {
    fn try_into_template(self) -> Result<Template, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(Template {
            id,
            key: self.key,
            name: self.name,
            description: self.description,
            version: self.version,
            body: self.body,
            created_at: self.created_at,
        })
    }
}

const TEMPLATE_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// SurrealDB implementation of the Template repository.
#[derive(Clone)]
pub struct SurrealTemplateRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTemplateRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TemplateRepository for SurrealTemplateRepository<C> {
    async fn create(&self, input: CreateTemplate) -> CompassResult<Template> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let key = input.key.clone();

        let result = self
            .db
            .query(
                "CREATE type::record('template', $id) SET \
                 key = $key, name = $name, description = $description, \
                 version = $version, body = $body",
            )
            .bind(("id", id_str.clone()))
            .bind(("key", input.key))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("version", input.version))
            .bind(("body", input.body))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| crate::error::map_throw(e, "template", &id_str))?;

        self.get_by_key(&key).await
    }

    async fn get_by_id(&self, id: Uuid) -> CompassResult<Template> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!(
                "SELECT {TEMPLATE_PROJECTION} \
                 FROM type::record('template', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TemplateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "template".into(),
            id: id_str,
        })?;

        Ok(row.try_into_template()?)
    }

    async fn get_by_key(&self, key: &str) -> CompassResult<Template> {
        let key_owned = key.to_string();

        let mut result = self
            .db
            .query(format!(
                "SELECT {TEMPLATE_PROJECTION} FROM template WHERE key = $key"
            ))
            .bind(("key", key_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TemplateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "template".into(),
            id: format!("key={key}"),
        })?;

        Ok(row.try_into_template()?)
    }

    async fn list(&self) -> CompassResult<Vec<Template>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {TEMPLATE_PROJECTION} FROM template ORDER BY key ASC"
            ))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TemplateRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_template())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }
}
