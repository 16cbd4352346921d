//! kabu-plus (株・プラス) CSV download service.

pub mod params;
pub mod provider;
pub mod response;

pub use params::{DEFAULT_BASE_URL, feed_url};
pub use provider::FeedClient;
