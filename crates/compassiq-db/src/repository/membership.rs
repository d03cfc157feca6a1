//! SurrealDB implementation of [`MembershipRepository`].
//!
//! Role demotions and removals that would leave an organization with
//! zero OWNERs are rejected inside the same transaction that performs
//! the write, so racing callers cannot both pass the count check.

use compassiq_core::error::CompassResult;
use compassiq_core::models::membership::{CreateMembership, Membership};
use compassiq_core::rbac::Role;
use compassiq_core::repository::{MembershipRepository, PaginatedResult, Pagination};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct MembershipRow {
    record_id: String,
    org_id: String,
    principal: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MembershipRow {
    fn try_into_membership(self) -> Result<Membership, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        let org_id = Uuid::parse_str(&self.org_id)
            .map_err(|e| DbError::Query(format!("invalid org UUID: {e}")))?;
        let role: Role = self
            .role
            .parse()
            .map_err(|_| DbError::Query(format!("invalid stored role: {}", self.role)))?;
        Ok(Membership {
            id,
            org_id,
            principal: self.principal,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

const MEMBERSHIP_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// SurrealDB implementation of the Membership repository.
#[derive(Clone)]
pub struct SurrealMembershipRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMembershipRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn get_row(&self, org_id: Uuid, principal: &str) -> Result<Membership, DbError> {
        let principal_owned = principal.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {MEMBERSHIP_PROJECTION} FROM membership \
                 WHERE org_id = $org_id AND principal = $principal"
            ))
            .bind(("org_id", org_id.to_string()))
            .bind(("principal", principal_owned))
            .await?;

        let rows: Vec<MembershipRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "membership".into(),
                id: format!("{org_id}/{principal}"),
            })?
            .try_into_membership()
    }
}

impl<C: Connection> MembershipRepository for SurrealMembershipRepository<C> {
    async fn create(&self, input: CreateMembership) -> CompassResult<Membership> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('membership', $id) SET \
                 org_id = $org_id, principal = $principal, role = $role",
            )
            .bind(("id", id_str.clone()))
            .bind(("org_id", input.org_id.to_string()))
            .bind(("principal", input.principal.clone()))
            .bind(("role", input.role.as_str()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| crate::error::map_throw(e, "membership", &id_str))?;

        Ok(self.get_row(input.org_id, &input.principal).await?)
    }

    async fn get(&self, org_id: Uuid, principal: &str) -> CompassResult<Membership> {
        Ok(self.get_row(org_id, principal).await?)
    }

    async fn list(
        &self,
        org_id: Uuid,
        pagination: Pagination,
    ) -> CompassResult<PaginatedResult<Membership>> {
        let org_str = org_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM membership \
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
                "SELECT {MEMBERSHIP_PROJECTION} FROM membership \
                 WHERE org_id = $org_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("org_id", org_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_membership())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn update_role(
        &self,
        org_id: Uuid,
        principal: &str,
        role: Role,
    ) -> CompassResult<Membership> {
        let principal_owned = principal.to_string();

        // Demoting an OWNER re-counts OWNERs inside the transaction;
        // the THROWn marker aborts before the UPDATE runs.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $m = (SELECT * FROM membership \
                     WHERE org_id = $org_id AND principal = $principal); \
                 IF array::len($m) == 0 { THROW 'membership_not_found' }; \
                 IF $m[0].role == 'OWNER' AND $role != 'OWNER' { \
                     LET $owners = (SELECT count() AS total FROM membership \
                         WHERE org_id = $org_id AND role = 'OWNER' GROUP ALL); \
                     IF $owners[0].total <= 1 { THROW 'last_owner' }; \
                 }; \
                 UPDATE membership SET role = $role, updated_at = time::now() \
                     WHERE org_id = $org_id AND principal = $principal; \
                 COMMIT TRANSACTION;",
            )
            .bind(("org_id", org_id.to_string()))
            .bind(("principal", principal_owned))
            .bind(("role", role.as_str()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| {
            crate::error::map_throw(e, "membership", &format!("{org_id}/{principal}"))
        })?;

        Ok(self.get_row(org_id, principal).await?)
    }

    async fn remove(&self, org_id: Uuid, principal: &str) -> CompassResult<()> {
        let principal_owned = principal.to_string();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $m = (SELECT * FROM membership \
                     WHERE org_id = $org_id AND principal = $principal); \
                 IF array::len($m) == 0 { THROW 'membership_not_found' }; \
                 IF $m[0].role == 'OWNER' { \
                     LET $owners = (SELECT count() AS total FROM membership \
                         WHERE org_id = $org_id AND role = 'OWNER' GROUP ALL); \
                     IF $owners[0].total <= 1 { THROW 'last_owner' }; \
                 }; \
                 DELETE membership \
                     WHERE org_id = $org_id AND principal = $principal; \
                 COMMIT TRANSACTION;",
            )
            .bind(("org_id", org_id.to_string()))
            .bind(("principal", principal_owned))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| {
            crate::error::map_throw(e, "membership", &format!("{org_id}/{principal}"))
        })?;

        Ok(())
    }
}
