//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. The slug and approval-token
//! namespaces are enforced unique at the index level.

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
-- Workspaces (tenant grouping, owned by a user)
-- =======================================================================
DEFINE TABLE workspace SCHEMAFULL;
DEFINE FIELD name ON TABLE workspace TYPE string;
DEFINE FIELD owner_id ON TABLE workspace TYPE string;
DEFINE FIELD created_at ON TABLE workspace TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_workspace_owner ON TABLE workspace COLUMNS owner_id;

-- =======================================================================
-- Consent records (one per piece of creator content, immutable)
-- =======================================================================
DEFINE TABLE consent_record SCHEMAFULL;
DEFINE FIELD slug ON TABLE consent_record TYPE string;
DEFINE FIELD content_url ON TABLE consent_record TYPE string;
DEFINE FIELD creator_handle ON TABLE consent_record TYPE string;
DEFINE FIELD platform ON TABLE consent_record TYPE string \
    ASSERT $value IN ['instagram', 'tiktok', 'twitter', 'youtube', \
    'facebook', 'linkedin', 'other'];
DEFINE FIELD workspace_id ON TABLE consent_record TYPE string;
DEFINE FIELD created_at ON TABLE consent_record TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_consent_record_slug ON TABLE consent_record \
    COLUMNS slug UNIQUE;
DEFINE INDEX idx_consent_record_workspace ON TABLE consent_record \
    COLUMNS workspace_id;

-- =======================================================================
-- Consent events (append-only negotiation steps per record)
-- =======================================================================
DEFINE TABLE consent_event SCHEMAFULL;
DEFINE FIELD record_id ON TABLE consent_event TYPE string;
DEFINE FIELD seq ON TABLE consent_event TYPE int;
DEFINE FIELD event_type ON TABLE consent_event TYPE string \
    ASSERT $value IN ['initial', 'scope_expansion'];
DEFINE FIELD scope ON TABLE consent_event TYPE string \
    ASSERT $value IN ['organic', 'paid_ads', 'organic_and_ads'];
DEFINE FIELD consent_text ON TABLE consent_event TYPE string;
DEFINE FIELD status ON TABLE consent_event TYPE string \
    ASSERT $value IN ['pending', 'approved', 'declined'];
DEFINE FIELD approval_token ON TABLE consent_event TYPE string;
DEFINE FIELD approval_token_expiry ON TABLE consent_event \
    TYPE option<datetime>;
DEFINE FIELD approved_at ON TABLE consent_event TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE consent_event TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_consent_event_token ON TABLE consent_event \
    COLUMNS approval_token UNIQUE;
DEFINE INDEX idx_consent_event_record_seq ON TABLE consent_event \
    COLUMNS record_id, seq UNIQUE;
";

/// Apply all pending migrations.
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
