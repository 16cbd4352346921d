//! Download and normalization of the kabu-plus CSV feeds.
//!
//! [`providers`] fetches a feed for one date and turns it into a
//! [`models::raw_table::RawTable`]; [`normalize`] maps that table onto the
//! canonical rows in [`models::rows`]. Persistence lives in `market_sync`.

pub mod models;
pub mod normalize;
pub mod providers;
