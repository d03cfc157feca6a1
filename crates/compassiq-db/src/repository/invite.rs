//! SurrealDB implementation of [`InviteRepository`].
//!
//! Acceptance consumes the token and creates the membership in one
//! transaction, so an invite can never be redeemed twice. A used token
//! is indistinguishable from an unknown one by design.

use compassiq_core::error::CompassResult;
use compassiq_core::models::invite::{CreateInvite, Invite};
use compassiq_core::models::membership::Membership;
use compassiq_core::rbac::Role;
use compassiq_core::repository::InviteRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct InviteRow {
    record_id: String,
    org_id: String,
    email: String,
    role: String,
    token_hash: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
}

impl InviteRow {
    fn try_into_invite(self) -> Result<Invite, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        let org_id = Uuid::parse_str(&self.org_id)
            .map_err(|e| DbError::Query(format!("invalid org UUID: {e}")))?;
        let role: Role = self
            .role
            .parse()
            .map_err(|_| DbError::Query(format!("invalid stored role: {}", self.role)))?;
        Ok(Invite {
            id,
            org_id,
            email: self.email,
            role,
            token_hash: self.token_hash,
            created_at: self.created_at,
            expires_at: self.expires_at,
            accepted_at: self.accepted_at,
        })
    }
}

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

const INVITE_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// SurrealDB implementation of the Invite repository.
#[derive(Clone)]
pub struct SurrealInviteRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInviteRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> Result<Invite, DbError> {
        let hash_owned = token_hash.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {INVITE_PROJECTION} FROM invite \
                 WHERE token_hash = $token_hash"
            ))
            .bind(("token_hash", hash_owned))
            .await?;

        let rows: Vec<InviteRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "invite".into(),
                id: "token".into(),
            })?
            .try_into_invite()
    }
}

impl<C: Connection> InviteRepository for SurrealInviteRepository<C> {
    async fn create(&self, input: CreateInvite) -> CompassResult<Invite> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('invite', $id) SET \
                 org_id = $org_id, email = $email, role = $role, \
                 token_hash = $token_hash, expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("org_id", input.org_id.to_string()))
            .bind(("email", input.email))
            .bind(("role", input.role.as_str()))
            .bind(("token_hash", input.token_hash.clone()))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| crate::error::map_throw(e, "invite", &id_str))?;

        Ok(self.get_by_token_hash(&input.token_hash).await?)
    }

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> CompassResult<Invite> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!(
                "SELECT {INVITE_PROJECTION} \
                 FROM type::record('invite', $id) \
                 WHERE org_id = $org_id"
            ))
            .bind(("id", id_str.clone()))
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InviteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "invite".into(),
            id: id_str,
        })?;

        Ok(row.try_into_invite()?)
    }

    async fn list(&self, org_id: Uuid) -> CompassResult<Vec<Invite>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {INVITE_PROJECTION} FROM invite \
                 WHERE org_id = $org_id \
                 ORDER BY created_at DESC"
            ))
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InviteRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_invite())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn accept(
        &self,
        token_hash: &str,
        principal: &str,
    ) -> CompassResult<(Invite, Membership)> {
        let hash_owned = token_hash.to_string();
        let principal_owned = principal.to_string();
        let membership_id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $inv = (SELECT * FROM invite \
                     WHERE token_hash = $token_hash); \
                 IF array::len($inv) == 0 { THROW 'invite_not_found' }; \
                 IF $inv[0].accepted_at != NONE { THROW 'invite_not_found' }; \
                 IF $inv[0].expires_at < time::now() { \
                     THROW 'invite_expired' }; \
                 UPDATE invite SET accepted_at = time::now() \
                     WHERE token_hash = $token_hash; \
                 CREATE type::record('membership', $membership_id) SET \
                     org_id = $inv[0].org_id, \
                     principal = $principal, \
                     role = $inv[0].role; \
                 COMMIT TRANSACTION;",
            )
            .bind(("token_hash", hash_owned.clone()))
            .bind(("principal", principal_owned.clone()))
            .bind(("membership_id", membership_id))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| crate::error::map_throw(e, "invite", "token"))?;

        let invite = self.get_by_token_hash(&hash_owned).await?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM membership \
                 WHERE org_id = $org_id AND principal = $principal",
            )
            .bind(("org_id", invite.org_id.to_string()))
            .bind(("principal", principal_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let membership = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "membership".into(),
                id: format!("{}/{}", invite.org_id, principal_owned),
            })?
            .try_into_membership()?;

        Ok((invite, membership))
    }

    async fn delete(&self, org_id: Uuid, id: Uuid) -> CompassResult<()> {
        self.db
            .query("DELETE type::record('invite', $id) WHERE org_id = $org_id")
            .bind(("id", id.to_string()))
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
