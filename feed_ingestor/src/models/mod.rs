//! Feed identities, the raw table handed over by the client, and the
//! canonical rows produced by the normalizer.

pub mod feed;
pub mod raw_table;
pub mod rows;
