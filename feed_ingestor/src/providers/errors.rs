use snafu::{Backtrace, Snafu};

use shared_utils::env::MissingEnvVarError;

/// Errors that can occur while building a feed client.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ClientInitError {
    /// A credential environment variable is missing.
    #[snafu(display("credentials unavailable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// Failed to build the reqwest client.
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// A transport-level failure: the request never produced an HTTP status.
///
/// Always considered transient by the retry loop.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TransportError {
    /// Network failure, timeout or body read error from reqwest.
    #[snafu(display("HTTP request failed: {source}"))]
    Request {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// Any other transport that could not reach the server.
    #[snafu(display("transport unavailable: {message}"))]
    Unavailable {
        message: String,
        backtrace: Backtrace,
    },
}

/// Outcome taxonomy of a single feed fetch.
///
/// Only [`FetchError::NotFound`] is benign; the orchestrator turns every
/// variant into a per-feed outcome and keeps going.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FetchError {
    /// The provider has not published the file (HTTP 404).
    #[snafu(display("feed not published yet: {url}"))]
    NotFound { url: String },

    /// Credentials were rejected (HTTP 401/403). Never retried.
    #[snafu(display("authentication rejected with HTTP {status}: {url}"))]
    Auth {
        url: String,
        status: u16,
        backtrace: Backtrace,
    },

    /// Retry budget exhausted on retryable statuses or transport failures.
    #[snafu(display("gave up after {attempts} attempts ({last}): {url}"))]
    Transient {
        url: String,
        attempts: u32,
        last: String,
        backtrace: Backtrace,
    },

    /// A non-retryable status other than 401/403/404.
    #[snafu(display("unexpected HTTP {status}: {url}"))]
    UnexpectedStatus {
        url: String,
        status: u16,
        backtrace: Backtrace,
    },

    /// The payload is not valid in the provider's encoding.
    #[snafu(display("payload is not valid {encoding}: {url}"))]
    Decode {
        url: String,
        encoding: &'static str,
        backtrace: Backtrace,
    },

    /// The decoded text is not parseable as CSV.
    #[snafu(display("malformed CSV in {url}: {source}"))]
    Parse {
        url: String,
        source: csv::Error,
        backtrace: Backtrace,
    },
}

impl FetchError {
    /// URL of the failed request.
    pub fn url(&self) -> &str {
        match self {
            FetchError::NotFound { url }
            | FetchError::Auth { url, .. }
            | FetchError::Transient { url, .. }
            | FetchError::UnexpectedStatus { url, .. }
            | FetchError::Decode { url, .. }
            | FetchError::Parse { url, .. } => url,
        }
    }
}
