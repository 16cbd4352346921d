//! Batch orchestrator: walks a date range and ingests every feed per day.
//!
//! ## Transactions
//! The whole run writes through one [`Session`](crate::db::session::Session)
//! and commits once at the end. A store error, or the future being dropped
//! mid-run, rolls everything back; re-running the range is the recovery.
//!
//! ## Failure isolation
//! Feed errors never abort the run. Each `(date, feed)` pair ends as a
//! [`FeedStatus`] in the returned [`RunReport`] and is logged; only
//! [`StoreError`] propagates.

pub mod report;

use std::{collections::BTreeSet, time::Duration};

use chrono::NaiveDate;
use diesel::SqliteConnection;
use feed_ingestor::{
    models::{feed::FeedKind, rows::Normalized},
    normalize::{SchemaMismatch, normalize_financials, normalize_margin, normalize_prices},
    providers::{FeedTransport, kabu_plus::FeedClient},
};
use tracing::{error, info, warn};

use crate::{
    calendar::{self, format_compact},
    models::{FinancialRecord, MarginRecord, PriceRecord},
    store::{Store, StoreError, Upsert, upsert},
    volume_profile::{ProfileParams, compute_volume_profile},
};

pub use report::{DayReport, FailReason, FeedOutcome, FeedStatus, RunReport, SkipReason};

/// Delay between consecutive dates when none is configured.
pub const DEFAULT_PACING: Duration = Duration::from_millis(1500);

/// Knobs of a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    /// Feeds to ingest, in attempt order.
    pub feeds: Vec<FeedKind>,
    /// Wait between dates; none after the last one.
    pub pacing: Duration,
    /// Recompute volume profiles of every priced code, as of the end date.
    pub volume_profile: Option<ProfileParams>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            feeds: FeedKind::ALL.to_vec(),
            pacing: DEFAULT_PACING,
            volume_profile: None,
        }
    }
}

/// Drives the feed client and the store for a date range.
pub struct BatchOrchestrator<T> {
    client: FeedClient<T>,
    options: BatchOptions,
}

impl<T: FeedTransport + Send + Sync> BatchOrchestrator<T> {
    /// Creates an orchestrator.
    pub fn new(client: FeedClient<T>, options: BatchOptions) -> Self {
        Self { client, options }
    }

    /// The options in effect.
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Ingests `start..=end` (weekends skipped) and commits once.
    pub async fn run(
        &self,
        store: &mut Store,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RunReport, StoreError> {
        let walk = calendar::walk(start, end);
        info!(
            start = %format_compact(start),
            end = %format_compact(end),
            trading_days = walk.trading_days.len(),
            weekend_days = walk.weekend_days,
            "batch run started"
        );

        let mut report = RunReport {
            weekend_days_skipped: walk.weekend_days,
            ..RunReport::default()
        };
        let mut priced = BTreeSet::new();
        let mut session = store.session()?;

        for (i, &date) in walk.trading_days.iter().enumerate() {
            if i > 0 && !self.options.pacing.is_zero() {
                tokio::time::sleep(self.options.pacing).await;
            }

            let mut day = DayReport {
                date,
                outcomes: Vec::with_capacity(self.options.feeds.len()),
            };
            for &feed in &self.options.feeds {
                let status = self.ingest(&mut session, feed, date, &mut priced).await?;
                log_outcome(date, feed, &status);
                day.outcomes.push(FeedOutcome { feed, status });
            }
            report.days.push(day);
        }

        if let Some(params) = self.options.volume_profile {
            for code in &priced {
                report.volume_bands +=
                    compute_volume_profile(&mut session, Some(code.as_str()), end, params)?;
            }
            info!(codes = priced.len(), bands = report.volume_bands, "volume profiles refreshed");
        }

        session.commit()?;
        info!(
            days = report.days.len(),
            rows = report.rows_written(),
            failures = report.failures().count(),
            "batch run committed"
        );
        Ok(report)
    }

    async fn ingest(
        &self,
        conn: &mut SqliteConnection,
        feed: FeedKind,
        date: NaiveDate,
        priced: &mut BTreeSet<String>,
    ) -> Result<FeedStatus, StoreError> {
        let table = match self.client.fetch_feed(feed, date).await {
            Ok(table) => table,
            Err(e) => return Ok(FeedStatus::from(&e)),
        };

        match feed {
            FeedKind::Price => {
                let normalized = normalize_prices(&table, date);
                if let (Ok(n), Some(_)) = (&normalized, self.options.volume_profile) {
                    priced.extend(n.rows.iter().map(|r| r.code.clone()));
                }
                persist::<_, PriceRecord>(conn, normalized)
            }
            FeedKind::Financial => {
                persist::<_, FinancialRecord>(conn, normalize_financials(&table, date))
            }
            FeedKind::Margin => persist::<_, MarginRecord>(conn, normalize_margin(&table)),
        }
    }
}

fn persist<R, C>(
    conn: &mut SqliteConnection,
    normalized: Result<Normalized<R>, SchemaMismatch>,
) -> Result<FeedStatus, StoreError>
where
    C: Upsert + From<R>,
{
    let normalized = match normalized {
        Ok(n) => n,
        Err(mismatch) => return Ok(FeedStatus::Skipped(SkipReason::SchemaMismatch(mismatch))),
    };
    let records: Vec<C> = normalized.rows.into_iter().map(C::from).collect();
    let rows = upsert(conn, &records)?;
    Ok(FeedStatus::Inserted {
        rows,
        dropped: normalized.dropped,
    })
}

fn log_outcome(date: NaiveDate, feed: FeedKind, status: &FeedStatus) {
    let date = format_compact(date);
    match status {
        FeedStatus::Inserted { rows, dropped } => {
            info!(%date, %feed, rows, dropped, "feed ingested")
        }
        FeedStatus::Skipped(SkipReason::NotFound) => {
            info!(%date, %feed, "feed not published, skipped")
        }
        FeedStatus::Skipped(reason) => warn!(%date, %feed, %reason, "feed skipped"),
        FeedStatus::Failed(reason) => error!(%date, %feed, %reason, "feed failed"),
    }
}
