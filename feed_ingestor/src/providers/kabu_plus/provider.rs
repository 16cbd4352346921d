use chrono::NaiveDate;
use snafu::{OptionExt, ResultExt};
use tracing::{debug, warn};

use crate::{
    models::{feed::FeedKind, raw_table::RawTable},
    providers::{
        FeedTransport,
        credentials::Credentials,
        errors::{
            AuthSnafu, DecodeSnafu, FetchError, NotFoundSnafu, ParseSnafu, TransientSnafu,
            UnexpectedStatusSnafu,
        },
        kabu_plus::{
            params::{DEFAULT_BASE_URL, feed_url},
            response::{ENCODING_NAME, decode_text, parse_table},
        },
        retry::RetryPolicy,
    },
};

/// Authenticated, retrying CSV downloader for one provider.
///
/// Credentials, base URL and retry policy are fixed at construction; the
/// transport is injected so tests can script responses.
pub struct FeedClient<T> {
    transport: T,
    credentials: Credentials,
    base_url: String,
    retry: RetryPolicy,
}

impl<T: FeedTransport + Send + Sync> FeedClient<T> {
    /// Creates a client against [`DEFAULT_BASE_URL`] with the default retry policy.
    pub fn new(transport: T, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the base URL (e.g. a local mirror or a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The active retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// URL of `kind` for `date` under this client's base URL.
    pub fn url_for(&self, kind: FeedKind, date: NaiveDate) -> String {
        feed_url(&self.base_url, kind, date)
    }

    /// Downloads the file of `kind` published for `date`.
    pub async fn fetch_feed(&self, kind: FeedKind, date: NaiveDate) -> Result<RawTable, FetchError> {
        let url = self.url_for(kind, date);
        self.fetch(&url, kind.skip_header_rows()).await
    }

    /// Downloads `url`, decodes it and splits it into a [`RawTable`].
    ///
    /// Retryable statuses and transport failures are retried per the policy;
    /// 404 is reported as [`FetchError::NotFound`] straight away, 401/403 as
    /// [`FetchError::Auth`], and any other status as
    /// [`FetchError::UnexpectedStatus`].
    pub async fn fetch(&self, url: &str, skip_header_rows: usize) -> Result<RawTable, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let last = match self.transport.get(url, &self.credentials).await {
                Ok(resp) if (200..300).contains(&resp.status) => {
                    debug!(url, attempt, bytes = resp.body.len(), "feed downloaded");
                    return decode(url, &resp.body, skip_header_rows);
                }
                Ok(resp) if resp.status == 404 => return NotFoundSnafu { url }.fail(),
                Ok(resp) if resp.status == 401 || resp.status == 403 => {
                    return AuthSnafu {
                        url,
                        status: resp.status,
                    }
                    .fail();
                }
                Ok(resp) if self.retry.is_retryable(resp.status) => {
                    format!("HTTP {}", resp.status)
                }
                Ok(resp) => {
                    return UnexpectedStatusSnafu {
                        url,
                        status: resp.status,
                    }
                    .fail();
                }
                Err(e) => e.to_string(),
            };

            if attempt > self.retry.max_retries {
                return TransientSnafu {
                    url,
                    attempts: attempt,
                    last,
                }
                .fail();
            }

            let delay = self.retry.backoff(attempt);
            warn!(url, attempt, reason = %last, delay_ms = delay.as_millis() as u64, "retrying feed download");
            tokio::time::sleep(delay).await;
        }
    }
}

fn decode(url: &str, body: &[u8], skip_header_rows: usize) -> Result<RawTable, FetchError> {
    let text = decode_text(body).context(DecodeSnafu {
        url,
        encoding: ENCODING_NAME,
    })?;
    parse_table(&text, skip_header_rows).context(ParseSnafu { url })
}
