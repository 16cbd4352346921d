//! What a batch run did, per date and per feed.

use std::fmt;

use chrono::NaiveDate;
use feed_ingestor::{models::feed::FeedKind, normalize::SchemaMismatch, providers::FetchError};

/// Benign reasons a feed was not written for a date. The run goes on.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The provider has not published the file (404).
    NotFound,
    /// The file's layout did not match the canonical schema.
    SchemaMismatch(SchemaMismatch),
    /// Retries ran out on overload statuses or network failures.
    Transient {
        /// Attempts made, including the first.
        attempts: u32,
        /// Last failure seen.
        last: String,
    },
    /// The payload was not valid in the provider's encoding.
    Decode,
    /// The decoded text was not parseable as CSV.
    Malformed(String),
}

/// Failures that need an operator (bad credentials, an API change).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailReason {
    /// Credentials rejected.
    Auth {
        /// 401 or 403.
        status: u16,
    },
    /// A status the client has no rule for.
    UnexpectedStatus {
        /// The HTTP status received.
        status: u16,
    },
}

/// Outcome of one feed for one date.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedStatus {
    /// Rows were upserted.
    Inserted {
        /// Rows written.
        rows: usize,
        /// Rows dropped for a blank key.
        dropped: usize,
    },
    /// Nothing written; not an error.
    Skipped(SkipReason),
    /// Nothing written; needs attention.
    Failed(FailReason),
}

impl From<&FetchError> for FeedStatus {
    fn from(err: &FetchError) -> Self {
        match err {
            FetchError::NotFound { .. } => FeedStatus::Skipped(SkipReason::NotFound),
            FetchError::Auth { status, .. } => {
                FeedStatus::Failed(FailReason::Auth { status: *status })
            }
            FetchError::Transient { attempts, last, .. } => {
                FeedStatus::Skipped(SkipReason::Transient {
                    attempts: *attempts,
                    last: last.clone(),
                })
            }
            FetchError::UnexpectedStatus { status, .. } => {
                FeedStatus::Failed(FailReason::UnexpectedStatus { status: *status })
            }
            FetchError::Decode { .. } => FeedStatus::Skipped(SkipReason::Decode),
            FetchError::Parse { source, .. } => {
                FeedStatus::Skipped(SkipReason::Malformed(source.to_string()))
            }
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotFound => f.write_str("not published"),
            SkipReason::SchemaMismatch(m) => write!(f, "schema mismatch: {m}"),
            SkipReason::Transient { attempts, last } => {
                write!(f, "gave up after {attempts} attempts ({last})")
            }
            SkipReason::Decode => f.write_str("undecodable payload"),
            SkipReason::Malformed(e) => write!(f, "malformed csv: {e}"),
        }
    }
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailReason::Auth { status } => write!(f, "authentication rejected (HTTP {status})"),
            FailReason::UnexpectedStatus { status } => write!(f, "unexpected HTTP {status}"),
        }
    }
}

/// One feed's outcome on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOutcome {
    /// Feed attempted.
    pub feed: FeedKind,
    /// What happened.
    pub status: FeedStatus,
}

/// Everything attempted for one trading day, in attempt order.
#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    /// The trading day.
    pub date: NaiveDate,
    /// One entry per configured feed.
    pub outcomes: Vec<FeedOutcome>,
}

/// Result of a committed batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Trading days attempted, ascending.
    pub days: Vec<DayReport>,
    /// Weekend days skipped without contacting the provider.
    pub weekend_days_skipped: usize,
    /// Volume profile bands written after ingestion.
    pub volume_bands: usize,
}

impl RunReport {
    /// Outcome of `feed` on `date`, if that pair was attempted.
    pub fn outcome(&self, date: NaiveDate, feed: FeedKind) -> Option<&FeedStatus> {
        self.days
            .iter()
            .find(|d| d.date == date)?
            .outcomes
            .iter()
            .find(|o| o.feed == feed)
            .map(|o| &o.status)
    }

    /// Rows written across all dates and feeds.
    pub fn rows_written(&self) -> usize {
        self.statuses()
            .map(|(_, _, s)| match s {
                FeedStatus::Inserted { rows, .. } => *rows,
                _ => 0,
            })
            .sum()
    }

    /// Every failed `(date, feed)` pair.
    pub fn failures(&self) -> impl Iterator<Item = (NaiveDate, FeedKind, &FailReason)> + '_ {
        self.statuses().filter_map(|(date, feed, s)| match s {
            FeedStatus::Failed(reason) => Some((date, feed, reason)),
            _ => None,
        })
    }

    fn statuses(&self) -> impl Iterator<Item = (NaiveDate, FeedKind, &FeedStatus)> + '_ {
        self.days
            .iter()
            .flat_map(|d| d.outcomes.iter().map(move |o| (d.date, o.feed, &o.status)))
    }
}
