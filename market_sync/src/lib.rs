//! Batch ingestion of the kabu-plus feeds into SQLite, plus the derived
//! volume profile and the `/analyze` request path built on top of it.

#![warn(missing_docs)]

pub mod analysis;
pub mod batch;
pub mod calendar;
pub mod config;
pub mod db;
pub mod models;
pub mod schema;
pub mod store;
pub mod volume_profile;
