//! Scoped write sessions.
//!
//! A [`Session`] is an open `BEGIN IMMEDIATE` transaction that borrows the
//! connection for its lifetime. It ends either through [`Session::commit`]
//! or by being dropped, which rolls back. Because the guard is a plain value
//! it can be held across `.await` points, which a closure transaction
//! cannot.

use std::ops::{Deref, DerefMut};

use diesel::{
    SqliteConnection,
    connection::{AnsiTransactionManager, TransactionManager},
};
use tracing::{debug, warn};

use crate::store::StoreError;

type Manager = AnsiTransactionManager;

/// Open write transaction; rolls back on drop unless committed.
pub struct Session<'c> {
    conn: &'c mut SqliteConnection,
    open: bool,
}

impl<'c> Session<'c> {
    /// Starts an immediate (write-locking) transaction on `conn`.
    pub fn begin(conn: &'c mut SqliteConnection) -> Result<Self, StoreError> {
        Manager::begin_transaction_sql(conn, "BEGIN IMMEDIATE")?;
        debug!("session opened");
        Ok(Self { conn, open: true })
    }

    /// Commits everything written through this session.
    pub fn commit(mut self) -> Result<(), StoreError> {
        self.open = false;
        <Manager as TransactionManager<SqliteConnection>>::commit_transaction(&mut *self.conn)?;
        debug!("session committed");
        Ok(())
    }

    /// Discards everything written through this session.
    pub fn rollback(mut self) -> Result<(), StoreError> {
        self.open = false;
        <Manager as TransactionManager<SqliteConnection>>::rollback_transaction(&mut *self.conn)?;
        debug!("session rolled back");
        Ok(())
    }
}

impl Deref for Session<'_> {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        &*self.conn
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        &mut *self.conn
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        match <Manager as TransactionManager<SqliteConnection>>::rollback_transaction(&mut *self.conn) {
            Ok(()) => debug!("uncommitted session rolled back"),
            Err(e) => warn!(error = %e, "rollback of uncommitted session failed"),
        }
    }
}

/// Runs `f` inside a [`Session`]: commits on `Ok`, rolls back on `Err`.
pub fn with_session<T, E, F>(conn: &mut SqliteConnection, f: F) -> Result<T, E>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, E>,
    E: From<StoreError>,
{
    let mut session = Session::begin(conn)?;
    let value = f(&mut session)?;
    session.commit()?;
    Ok(value)
}
