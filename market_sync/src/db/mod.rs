//! Database utilities for connections, schema migrations and write sessions.
//!
//! This module provides:
//! - [`connection::connect_sqlite`]: applies WAL, foreign_keys=ON, and a 5000ms busy_timeout.
//! - Embedded Diesel migrations: [`migrate::run_pending`] and [`migrate::run_sqlite`].
//! - [`session::Session`]: a `BEGIN IMMEDIATE` guard that rolls back unless committed.
//!
//! Example:
//! ```no_run
//! use market_sync::db::{connection, migrate, session::with_session};
//!
//! let db_path = std::env::temp_dir().join("market_sync_example.db");
//! migrate::run_sqlite(db_path.to_str().unwrap()).expect("migrations");
//!
//! let mut conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! with_session::<_, market_sync::store::StoreError, _>(&mut conn, |_conn| Ok(()))
//!     .expect("empty session commits");
//! ```

pub mod connection;
pub mod migrate;
pub mod session;
