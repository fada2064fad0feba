//! Schema definitions and migration runner for SurrealDB.
//!
//! All tables are SCHEMAFULL. UUIDs are stored as strings, enums as
//! lowercase strings guarded by ASSERT constraints. Rates are stored as
//! decimals and range-checked in the database as well as in the validators.

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
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Layout: garages, floors, bays
-- =======================================================================
DEFINE TABLE garage SCHEMAFULL;
DEFINE FIELD name ON TABLE garage TYPE string;
DEFINE FIELD location ON TABLE garage TYPE string;
DEFINE FIELD created_at ON TABLE garage TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE garage TYPE datetime \
    DEFAULT time::now();

DEFINE TABLE floor SCHEMAFULL;
DEFINE FIELD garage_id ON TABLE floor TYPE string;
DEFINE FIELD name ON TABLE floor TYPE string;
DEFINE FIELD created_at ON TABLE floor TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE floor TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_floor_garage ON TABLE floor COLUMNS garage_id;

DEFINE TABLE bay SCHEMAFULL;
DEFINE FIELD floor_id ON TABLE bay TYPE string;
DEFINE FIELD name ON TABLE bay TYPE string;
DEFINE FIELD created_at ON TABLE bay TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE bay TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_bay_floor ON TABLE bay COLUMNS floor_id;

-- =======================================================================
-- Parking spots
-- =======================================================================
DEFINE TABLE parking_spot SCHEMAFULL;
DEFINE FIELD floor_id ON TABLE parking_spot TYPE string;
DEFINE FIELD bay_id ON TABLE parking_spot TYPE option<string>;
DEFINE FIELD name ON TABLE parking_spot TYPE string;
DEFINE FIELD size ON TABLE parking_spot TYPE string \
    ASSERT $value IN ['compact', 'standard', 'oversized'];
DEFINE FIELD status ON TABLE parking_spot TYPE string \
    ASSERT $value IN ['available', 'occupied'];
DEFINE FIELD rate ON TABLE parking_spot TYPE decimal \
    ASSERT $value > 0dec AND $value <= 10000dec;
DEFINE FIELD features ON TABLE parking_spot TYPE option<object> FLEXIBLE;
DEFINE FIELD created_at ON TABLE parking_spot TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE parking_spot TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_parking_spot_floor ON TABLE parking_spot \
    COLUMNS floor_id;
DEFINE INDEX idx_parking_spot_bay ON TABLE parking_spot COLUMNS bay_id;
DEFINE INDEX idx_parking_spot_status ON TABLE parking_spot \
    COLUMNS status;

-- =======================================================================
-- Cars (occupancy history survives check-out)
-- =======================================================================
DEFINE TABLE car SCHEMAFULL;
DEFINE FIELD license_plate ON TABLE car TYPE string \
    ASSERT string::len($value) >= 1 AND string::len($value) <= 20;
DEFINE FIELD parking_spot_id ON TABLE car TYPE option<string>;
DEFINE FIELD checked_in_at ON TABLE car TYPE option<datetime>;
DEFINE FIELD checked_out_at ON TABLE car TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE car TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE car TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_car_license_plate ON TABLE car COLUMNS license_plate;
DEFINE INDEX idx_car_parking_spot ON TABLE car COLUMNS parking_spot_id;

-- =======================================================================
-- Parking fees
-- =======================================================================
DEFINE TABLE parking_fee SCHEMAFULL;
DEFINE FIELD car_id ON TABLE parking_fee TYPE string;
DEFINE FIELD billed_at ON TABLE parking_fee TYPE datetime;
DEFINE FIELD created_at ON TABLE parking_fee TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE parking_fee TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_parking_fee_car ON TABLE parking_fee COLUMNS car_id;
";

/// Highest migration version recorded in the database, 0 when none.
pub async fn schema_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map_or(0, |m| m.version))
}

/// Bring the schema up to date and return the versions applied by this
/// call, oldest first. Already-current databases yield an empty list.
///
/// A database recorded at a version this build does not know is refused
/// rather than written to.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<Vec<u32>, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = schema_version(db).await?;
    let latest = MIGRATIONS.last().map_or(0, |m| m.version);
    if current > latest {
        return Err(DbError::Migration(format!(
            "database schema is at v{current}, newer than the v{latest} this build knows"
        )));
    }

    let mut applied = Vec::new();
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(db, migration).await?;
        applied.push(migration.version);
    }
    Ok(applied)
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    let failed = |stage: &str, e: surrealdb::Error| {
        DbError::Migration(format!(
            "v{} '{}' {stage}: {e}",
            migration.version, migration.name
        ))
    };

    info!(version = migration.version, name = migration.name, "Applying migration");
    db.query(migration.sql)
        .await?
        .check()
        .map_err(|e| failed("failed", e))?;
    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| failed("could not be recorded", e))?;
    Ok(())
}
