//! Canonical rows produced by the column normalizer.
//!
//! These are storage-agnostic: `market_sync` maps them onto its diesel
//! tables. Every numeric field is optional because the provider leaves cells
//! blank (or `-`) for suspended or newly listed codes, and a missing value
//! must survive as null rather than zero.

/// One trading day of OHLCV for a single code.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPrice {
    /// Security code, text with leading zeros preserved (e.g. "7203", "130A").
    pub code: String,
    /// Trading date as `YYYYMMDD`.
    pub date: String,
    /// Opening price.
    pub open: Option<f64>,
    /// Highest price of the session.
    pub high: Option<f64>,
    /// Lowest price of the session.
    pub low: Option<f64>,
    /// Last traded price (the feed's `株価` column).
    pub close: Option<f64>,
    /// Shares traded.
    pub volume: Option<i64>,
}

/// Valuation snapshot of a code on a trading date.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyFinancial {
    /// Security code.
    pub code: String,
    /// Snapshot date as `YYYYMMDD`.
    pub date: String,
    /// Market capitalisation in millions of yen.
    pub market_cap: Option<f64>,
    /// Forecast price/earnings ratio.
    pub per_forecast: Option<f64>,
    /// Actual price/book ratio.
    pub pbr_actual: Option<f64>,
    /// Forecast earnings per share.
    pub eps_forecast: Option<f64>,
    /// Actual book value per share.
    pub bps_actual: Option<f64>,
    /// Forecast dividend yield (percent).
    pub dividend_yield: Option<f64>,
}

/// Weekly margin balances, keyed by the announcement date.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyMargin {
    /// Security code.
    pub code: String,
    /// Announcement date as `YYYYMMDD`.
    pub date: String,
    /// Outstanding margin sell balance (shares).
    pub sell_balance: Option<i64>,
    /// Outstanding margin buy balance (shares).
    pub buy_balance: Option<i64>,
    /// Buy/sell balance ratio.
    pub ratio: Option<f64>,
}

/// Normalizer output: the rows that could be keyed plus how many could not.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    /// Canonical rows in feed order.
    pub rows: Vec<T>,
    /// Rows dropped because their key cells (code, or margin date) were blank.
    pub dropped: usize,
}
