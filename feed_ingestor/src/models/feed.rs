//! The three CSV products published by kabu-plus that this crate understands.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Publication cadence of a feed; it is also a path segment of the feed URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cadence {
    /// One file per trading day.
    Daily,
    /// One file per week, named after its announcement date.
    Weekly,
}

impl Cadence {
    /// URL path segment (`daily` / `weekly`).
    pub fn as_path(self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
        }
    }
}

/// Which upstream feed a request or a row belongs to (serde snake_case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    /// Daily OHLCV for every listed code (`japan-all-stock-prices-2`).
    Price,
    /// Daily valuation snapshot (`japan-all-stock-data`).
    Financial,
    /// Weekly margin balances (`tosho-stock-margin-transactions-2`).
    Margin,
}

impl FeedKind {
    /// Every feed in the order a batch run ingests them.
    pub const ALL: [FeedKind; 3] = [FeedKind::Price, FeedKind::Financial, FeedKind::Margin];

    /// Provider-side product name, used both as directory and file prefix.
    pub fn feed_name(self) -> &'static str {
        match self {
            FeedKind::Price => "japan-all-stock-prices-2",
            FeedKind::Financial => "japan-all-stock-data",
            FeedKind::Margin => "tosho-stock-margin-transactions-2",
        }
    }

    /// How often the provider publishes this feed.
    pub fn cadence(self) -> Cadence {
        match self {
            FeedKind::Price | FeedKind::Financial => Cadence::Daily,
            FeedKind::Margin => Cadence::Weekly,
        }
    }

    /// Number of lines preceding the header line in the published file.
    ///
    /// The margin file carries a title line above its (garbled) header.
    pub fn skip_header_rows(self) -> usize {
        match self {
            FeedKind::Price | FeedKind::Financial => 0,
            FeedKind::Margin => 1,
        }
    }

    /// Short lowercase label used in logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            FeedKind::Price => "price",
            FeedKind::Financial => "financial",
            FeedKind::Margin => "margin",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
