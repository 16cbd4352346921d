//! Embedded schema migrations.

use diesel::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::{db::connection::connect_sqlite, store::StoreError};

/// Embedded Diesel migrations bundled with this crate.
///
/// Every statement is `CREATE TABLE IF NOT EXISTS`, so applying them to a
/// database created by an older tool is harmless.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies pending migrations on an open connection; returns how many ran.
pub fn run_pending(conn: &mut SqliteConnection) -> Result<usize, StoreError> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(StoreError::Migration)?;
    for version in &applied {
        info!(%version, "applied migration");
    }
    Ok(applied.len())
}

/// Opens the database at `url` (creating it if needed) and migrates it.
pub fn run_sqlite(url: &str) -> Result<usize, StoreError> {
    let mut conn = connect_sqlite(url)?;
    run_pending(&mut conn)
}
