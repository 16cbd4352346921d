//! reqwest-backed [`FeedTransport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use snafu::ResultExt;

use crate::providers::{
    FeedTransport, HttpResponse,
    credentials::Credentials,
    errors::{ClientBuildSnafu, ClientInitError, RequestSnafu, TransportError},
};

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// User agent announced to the provider.
pub const DEFAULT_USER_AGENT: &str = "StockAnalysisBot/1.0";

/// Production transport: one pooled reqwest client, basic auth per request.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with the given timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ClientInitError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context(ClientBuildSnafu)?;
        Ok(Self { client })
    }

    /// Transport with [`DEFAULT_TIMEOUT`] and [`DEFAULT_USER_AGENT`].
    pub fn with_defaults() -> Result<Self, ClientInitError> {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }
}

#[async_trait]
impl FeedTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .basic_auth(credentials.user(), Some(credentials.password()))
            .send()
            .await
            .context(RequestSnafu)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.context(RequestSnafu)?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
