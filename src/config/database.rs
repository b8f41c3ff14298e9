//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`. Tables are
//! generated from the entity definitions with `Schema::create_table_from_entity`, so the schema
//! always matches the Rust structs without hand-written SQL. Creation uses `IF NOT EXISTS`, which
//! makes it safe to run on every start.

use crate::entities::{Department, Profile, Schedule, TimeRecord};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::debug;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/shift_saldo.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the default
/// `SQLite` path.
pub fn get_database_url() -> Result<String> {
    super::env_or_default("DATABASE_URL", DEFAULT_DATABASE_URL)
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set. Both `SQLite` and
/// `PostgreSQL` URLs are accepted.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url()?;
    ensure_sqlite_dir(&database_url)?;
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the parent directory of a file-backed `SQLite` database.
fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(db.get_database_backend().build(&statement))
        .await?;
    Ok(())
}

/// Creates all tables from the entity definitions.
///
/// Referenced tables come first so foreign keys resolve: departments, profiles, schedules,
/// time records.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Department).await?;
    create_table(db, &schema, Profile).await?;
    create_table(db, &schema, Schedule).await?;
    create_table(db, &schema, TimeRecord).await?;

    Ok(())
}
