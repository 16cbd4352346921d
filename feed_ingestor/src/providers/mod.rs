//! Provider abstraction for CSV feed downloads.
//!
//! The HTTP layer is split behind [`FeedTransport`] so the retry and
//! classification logic in [`kabu_plus::provider::FeedClient`] can be driven
//! by a scripted transport in tests, while production uses
//! [`http::ReqwestTransport`].
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use feed_ingestor::providers::{
//!     FeedTransport, HttpResponse, credentials::Credentials, errors::TransportError,
//! };
//!
//! struct AlwaysMissing;
//!
//! #[async_trait]
//! impl FeedTransport for AlwaysMissing {
//!     async fn get(
//!         &self,
//!         _url: &str,
//!         _credentials: &Credentials,
//!     ) -> Result<HttpResponse, TransportError> {
//!         Ok(HttpResponse::new(404, Vec::new()))
//!     }
//! }
//! ```

pub mod credentials;
pub mod errors;
pub mod http;
pub mod kabu_plus;
pub mod retry;

use async_trait::async_trait;

use crate::providers::{credentials::Credentials, errors::TransportError};

pub use errors::{ClientInitError, FetchError};

/// Status and raw body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Undecoded response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Convenience constructor.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// One authenticated GET. Implementations must not retry on their own.
#[async_trait]
pub trait FeedTransport {
    /// Performs a GET with basic auth and returns whatever status came back.
    ///
    /// An `Err` means no status was received at all (connect failure,
    /// timeout, truncated body).
    async fn get(&self, url: &str, credentials: &Credentials)
    -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: FeedTransport + Send + Sync + ?Sized> FeedTransport for &T {
    async fn get(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<HttpResponse, TransportError> {
        (**self).get(url, credentials).await
    }
}

#[async_trait]
impl<T: FeedTransport + Send + Sync + ?Sized> FeedTransport for Box<T> {
    async fn get(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<HttpResponse, TransportError> {
        (**self).get(url, credentials).await
    }
}
