//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Organizations (tenancy root)
-- =======================================================================
DEFINE TABLE organization SCHEMAFULL;
DEFINE FIELD name ON TABLE organization TYPE string;
DEFINE FIELD slug ON TABLE organization TYPE string;
DEFINE FIELD is_demo ON TABLE organization TYPE bool DEFAULT false;
DEFINE FIELD metadata ON TABLE organization TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_organization_slug ON TABLE organization \
    COLUMNS slug UNIQUE;

-- =======================================================================
-- Memberships (org scope)
-- =======================================================================
DEFINE TABLE membership SCHEMAFULL;
DEFINE FIELD org_id ON TABLE membership TYPE string;
DEFINE FIELD principal ON TABLE membership TYPE string;
DEFINE FIELD role ON TABLE membership TYPE string \
    ASSERT $value IN ['OWNER', 'ADMIN', 'FINANCE', 'OPS', 'SALES', \
    'VIEWER'];
DEFINE FIELD created_at ON TABLE membership TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE membership TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_membership_org_principal ON TABLE membership \
    COLUMNS org_id, principal UNIQUE;

-- =======================================================================
-- Templates (shared catalog, not org-scoped)
-- =======================================================================
DEFINE TABLE template SCHEMAFULL;
DEFINE FIELD key ON TABLE template TYPE string;
DEFINE FIELD name ON TABLE template TYPE string;
DEFINE FIELD description ON TABLE template TYPE string;
DEFINE FIELD version ON TABLE template TYPE int DEFAULT 1;
DEFINE FIELD body ON TABLE template TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE template TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_template_key ON TABLE template COLUMNS key UNIQUE;

-- =======================================================================
-- Instances (org scope; template pinned at creation)
-- =======================================================================
DEFINE TABLE instance SCHEMAFULL;
DEFINE FIELD org_id ON TABLE instance TYPE string;
DEFINE FIELD template_id ON TABLE instance TYPE string;
DEFINE FIELD name ON TABLE instance TYPE string \
    ASSERT string::len($value) > 0;
DEFINE FIELD status ON TABLE instance TYPE string \
    ASSERT $value IN ['draft', 'published', 'archived'];
DEFINE FIELD published_at ON TABLE instance TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE instance TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE instance TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_instance_org ON TABLE instance COLUMNS org_id;

-- =======================================================================
-- Alerts (org scope; bulk-created by publication fan-out)
-- =======================================================================
DEFINE TABLE alert SCHEMAFULL;
DEFINE FIELD org_id ON TABLE alert TYPE string;
DEFINE FIELD instance_id ON TABLE alert TYPE option<string>;
DEFINE FIELD severity ON TABLE alert TYPE string \
    ASSERT $value IN ['low', 'medium', 'high', 'critical'];
DEFINE FIELD alert_type ON TABLE alert TYPE string;
DEFINE FIELD title ON TABLE alert TYPE string \
    ASSERT string::len($value) > 0;
DEFINE FIELD description ON TABLE alert TYPE string DEFAULT '';
DEFINE FIELD state ON TABLE alert TYPE string \
    ASSERT $value IN ['open', 'acknowledged', 'in_progress', \
    'resolved', 'dismissed'];
DEFINE FIELD owner ON TABLE alert TYPE option<string>;
DEFINE FIELD due_at ON TABLE alert TYPE option<datetime>;
DEFINE FIELD disposition ON TABLE alert TYPE option<string>;
DEFINE FIELD created_at ON TABLE alert TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE alert TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_alert_org_state ON TABLE alert COLUMNS org_id, state;
DEFINE INDEX idx_alert_org_instance ON TABLE alert \
    COLUMNS org_id, instance_id;

-- =======================================================================
-- Cadence items (org scope; created by publication fan-out)
-- =======================================================================
DEFINE TABLE cadence_item SCHEMAFULL;
DEFINE FIELD org_id ON TABLE cadence_item TYPE string;
DEFINE FIELD instance_id ON TABLE cadence_item TYPE string;
DEFINE FIELD cadence ON TABLE cadence_item TYPE string;
DEFINE FIELD title ON TABLE cadence_item TYPE string \
    ASSERT string::len($value) > 0;
DEFINE FIELD rules ON TABLE cadence_item TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE cadence_item TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_cadence_org_instance ON TABLE cadence_item \
    COLUMNS org_id, instance_id;

-- =======================================================================
-- Invites (org scope; single-use tokens, status derived at read time)
-- =======================================================================
DEFINE TABLE invite SCHEMAFULL;
DEFINE FIELD org_id ON TABLE invite TYPE string;
DEFINE FIELD email ON TABLE invite TYPE string;
DEFINE FIELD role ON TABLE invite TYPE string \
    ASSERT $value IN ['OWNER', 'ADMIN', 'FINANCE', 'OPS', 'SALES', \
    'VIEWER'];
DEFINE FIELD token_hash ON TABLE invite TYPE string;
DEFINE FIELD created_at ON TABLE invite TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD expires_at ON TABLE invite TYPE datetime;
DEFINE FIELD accepted_at ON TABLE invite TYPE option<datetime>;
DEFINE INDEX idx_invite_token ON TABLE invite COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_invite_org ON TABLE invite COLUMNS org_id;

-- =======================================================================
-- Audit Log (org scope, append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD org_id ON TABLE audit_log TYPE string;
DEFINE FIELD actor ON TABLE audit_log TYPE string;
DEFINE FIELD action ON TABLE audit_log TYPE string;
DEFINE FIELD entity_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD outcome ON TABLE audit_log TYPE string \
    ASSERT $value IN ['success', 'denied', 'failure'];
DEFINE FIELD detail ON TABLE audit_log TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD timestamp ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_org_time ON TABLE audit_log \
    COLUMNS org_id, timestamp;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
