//! Schema store: owns the SQLite connection, the schema, and keyed upserts.
//!
//! Writes go through a [`Session`] so a whole batch run lands in one
//! transaction. Every table is keyed, and [`upsert`] replaces the row that
//! shares the key, so re-running a date range never duplicates rows.

pub mod queries;

use diesel::{QueryResult, RunQueryDsl, SqliteConnection, insert_into};
use tracing::{debug, info};

use crate::{
    db::{
        connection::connect_sqlite,
        migrate,
        session::{self, Session},
    },
    models::{CompanyRecord, FinancialRecord, MarginRecord, PriceRecord, VolumeBandRecord},
    schema,
};

#[derive(thiserror::Error, Debug)]
/// Errors raised by the store. Any of these aborts a batch run uncommitted.
pub enum StoreError {
    #[error("failed to open database: {0}")]
    /// The database could not be opened.
    Connection(#[from] diesel::ConnectionError),

    #[error("database query failed: {0}")]
    /// A statement failed.
    Query(#[from] diesel::result::Error),

    #[error("schema migration failed: {0}")]
    /// Embedded migrations could not be applied.
    Migration(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid argument: {0}")]
    /// A caller passed a value the store cannot work with.
    InvalidArgument(String),
}

/// A record type with a keyed insert-or-replace statement.
pub trait Upsert {
    /// Table the record belongs to, for logs.
    const TABLE: &'static str;

    /// Inserts `self`, replacing the row with the same key.
    fn upsert_one(&self, conn: &mut SqliteConnection) -> QueryResult<usize>;
}

macro_rules! impl_upsert {
    ($record:ty, $table:ident, $key:expr) => {
        impl Upsert for $record {
            const TABLE: &'static str = stringify!($table);

            fn upsert_one(&self, conn: &mut SqliteConnection) -> QueryResult<usize> {
                use schema::$table::dsl::*;
                insert_into($table)
                    .values(self)
                    .on_conflict($key)
                    .do_update()
                    .set(self)
                    .execute(conn)
            }
        }
    };
}

impl_upsert!(PriceRecord, daily_prices, (code, date));
impl_upsert!(FinancialRecord, daily_financials, (code, date));
impl_upsert!(MarginRecord, weekly_margin, (code, date));
impl_upsert!(VolumeBandRecord, volume_profile, (code, analysis_date, price_band));
impl_upsert!(CompanyRecord, companies, code);

/// Upserts every row; returns the number of rows written.
pub fn upsert<R: Upsert>(conn: &mut SqliteConnection, rows: &[R]) -> Result<usize, StoreError> {
    let mut written = 0;
    for row in rows {
        written += row.upsert_one(conn)?;
    }
    debug!(table = R::TABLE, rows = written, "upserted");
    Ok(written)
}

/// An open, migrated database.
pub struct Store {
    conn: SqliteConnection,
    database_url: String,
}

impl Store {
    /// Opens (creating if needed) and migrates the database at `database_url`.
    pub fn open(database_url: &str) -> Result<Self, StoreError> {
        let mut conn = connect_sqlite(database_url)?;
        let applied = migrate::run_pending(&mut conn)?;
        info!(database_url, applied, "store ready");
        Ok(Self {
            conn,
            database_url: database_url.to_string(),
        })
    }

    /// Location the store was opened from.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// The underlying connection, for reads outside a session.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    /// Opens a write session; see [`Session`].
    pub fn session(&mut self) -> Result<Session<'_>, StoreError> {
        Session::begin(&mut self.conn)
    }

    /// Runs `f` in a session that commits on `Ok` and rolls back on `Err`.
    pub fn with_session<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, E>,
        E: From<StoreError>,
    {
        session::with_session(&mut self.conn, f)
    }
}
