//! Runtime configuration: parsing, validation, and loading.
//!
//! A TOML file describes where the database lives, how the feed client
//! talks to the provider, and how a batch run is paced. Every field has a
//! default, so an empty file (or no file) is a valid configuration.
//!
//! ```toml
//! database_url = "data/stock_data.db"
//!
//! [feed]
//! base_url = "https://csvex.com/kabu.plus/csv"
//! timeout_secs = 30
//!
//! [feed.retry]
//! max_retries = 3
//! backoff_ms = 500
//!
//! [batch]
//! pacing_ms = 1500
//! feeds = ["price", "financial", "margin"]
//!
//! [batch.volume_profile]
//! enabled = true
//! lookback_days = 365
//! band_width = 10.0
//! ```
//!
//! Credentials never live in this file; they come from `KABU_PLUS_USER` and
//! `KABU_PLUS_PASSWORD`. `DATABASE_URL`, when set, overrides `database_url`.

use std::time::Duration;

use anyhow::{Context, bail};
use feed_ingestor::{
    models::feed::FeedKind,
    providers::{
        http::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT},
        kabu_plus::DEFAULT_BASE_URL,
        retry::RetryPolicy,
    },
};
use serde::{Deserialize, Serialize};
use shared_utils::env::get_env_var_opt;

use crate::{
    batch::{BatchOptions, DEFAULT_PACING},
    volume_profile::ProfileParams,
};

/// Environment variable overriding [`Settings::database_url`].
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Database location used when nothing is configured.
pub const DEFAULT_DATABASE_URL: &str = "data/stock_data.db";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// SQLite file path (or `file:` URL).
    pub database_url: String,
    /// Feed client settings.
    pub feed: FeedSettings,
    /// Batch run settings.
    pub batch: BatchSettings,
}

/// How the feed client reaches the provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedSettings {
    /// Root of the CSV tree.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// User agent announced to the provider.
    pub user_agent: String,
    /// Retry behaviour.
    pub retry: RetrySettings,
}

/// Serialized form of [`RetryPolicy`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base of the exponential backoff.
    pub backoff_ms: u64,
    /// Statuses worth retrying.
    pub statuses: Vec<u16>,
}

/// How a batch run proceeds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchSettings {
    /// Delay between dates.
    pub pacing_ms: u64,
    /// Feeds to ingest, in order.
    pub feeds: Vec<FeedKind>,
    /// Post-ingest volume profile refresh.
    pub volume_profile: VolumeProfileSettings,
}

/// Volume profile refresh after a batch run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct VolumeProfileSettings {
    /// Whether the batch recomputes profiles of the codes it priced.
    pub enabled: bool,
    /// Calendar days of history per profile.
    pub lookback_days: u32,
    /// Price band width in yen.
    pub band_width: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            feed: FeedSettings::default(),
            batch: BatchSettings::default(),
        }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetrySettings::default(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            backoff_ms: policy.backoff_factor.as_millis() as u64,
            statuses: policy.retryable_statuses,
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            pacing_ms: DEFAULT_PACING.as_millis() as u64,
            feeds: FeedKind::ALL.to_vec(),
            volume_profile: VolumeProfileSettings::default(),
        }
    }
}

impl Default for VolumeProfileSettings {
    fn default() -> Self {
        let params = ProfileParams::default();
        Self {
            enabled: false,
            lookback_days: params.lookback_days,
            band_width: params.band_width,
        }
    }
}

impl FeedSettings {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RetrySettings {
    /// The policy handed to the feed client.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_factor: Duration::from_millis(self.backoff_ms),
            retryable_statuses: self.statuses.clone(),
        }
    }
}

impl BatchSettings {
    /// The options handed to the orchestrator.
    pub fn options(&self) -> BatchOptions {
        BatchOptions {
            feeds: self.feeds.clone(),
            pacing: Duration::from_millis(self.pacing_ms),
            volume_profile: self.volume_profile.enabled.then(|| self.volume_profile.params()),
        }
    }
}

impl VolumeProfileSettings {
    /// Band width and lookback as computation parameters.
    pub fn params(&self) -> ProfileParams {
        ProfileParams {
            lookback_days: self.lookback_days,
            band_width: self.band_width,
        }
    }
}

impl Settings {
    /// Rejects values that parse but cannot work, and removes duplicate feeds.
    pub fn validate(&mut self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            bail!("database_url cannot be empty");
        }
        if self.feed.base_url.trim().is_empty() {
            bail!("feed.base_url cannot be empty");
        }
        if self.feed.timeout_secs == 0 {
            bail!("feed.timeout_secs must be at least 1");
        }
        let bw = self.batch.volume_profile.band_width;
        if !(bw.is_finite() && bw > 0.0) {
            bail!("batch.volume_profile.band_width must be positive, got {bw}");
        }

        let mut seen = Vec::with_capacity(self.batch.feeds.len());
        self.batch.feeds.retain(|f| {
            let first = !seen.contains(f);
            seen.push(*f);
            first
        });
        if self.batch.feeds.is_empty() {
            bail!("batch.feeds cannot be empty");
        }
        Ok(())
    }

    /// Applies the `DATABASE_URL` override, if set.
    pub fn apply_env(&mut self) {
        if let Some(url) = get_env_var_opt(DATABASE_URL_ENV) {
            self.database_url = url;
        }
    }
}

/// Parse + validate settings from a TOML string.
pub fn load_settings_str(toml_str: &str) -> anyhow::Result<Settings> {
    let mut settings: Settings = toml::from_str(toml_str).context("failed to parse settings TOML")?;
    settings.validate().context("invalid settings")?;
    Ok(settings)
}

/// Parse + validate settings from a file.
pub fn load_settings_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<Settings> {
    let s = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read settings file {}", path.as_ref().display()))?;
    load_settings_str(&s)
}
