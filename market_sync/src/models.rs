//! Diesel records for the tables in [`crate::schema`].
//!
//! One record type per table, usable both for reads (`Queryable`,
//! `Selectable`) and for upserts (`Insertable`, `AsChangeset`). Changesets
//! treat `None` as `NULL`, so re-ingesting a row whose value went missing
//! upstream clears the stored value instead of leaving a stale one.

use diesel::prelude::*;
use feed_ingestor::models::rows::{DailyFinancial, DailyPrice, WeeklyMargin};

use crate::schema::*;

/// A row of [`crate::schema::daily_prices`].
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = daily_prices, primary_key(code, date))]
#[diesel(treat_none_as_null = true, check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceRecord {
    /// Security code.
    pub code: String,
    /// Trading date, `YYYYMMDD`.
    pub date: String,
    /// Opening price.
    pub open: Option<f64>,
    /// Session high.
    pub high: Option<f64>,
    /// Session low.
    pub low: Option<f64>,
    /// Last traded price.
    pub close: Option<f64>,
    /// Shares traded.
    pub volume: Option<i64>,
}

impl From<DailyPrice> for PriceRecord {
    fn from(r: DailyPrice) -> Self {
        Self {
            code: r.code,
            date: r.date,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r.volume,
        }
    }
}

/// A row of [`crate::schema::daily_financials`].
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = daily_financials, primary_key(code, date))]
#[diesel(treat_none_as_null = true, check_for_backend(diesel::sqlite::Sqlite))]
pub struct FinancialRecord {
    /// Security code.
    pub code: String,
    /// Snapshot date, `YYYYMMDD`.
    pub date: String,
    /// Market capitalisation, millions of yen.
    pub market_cap: Option<f64>,
    /// Forecast P/E.
    pub per_forecast: Option<f64>,
    /// Actual P/B.
    pub pbr_actual: Option<f64>,
    /// Forecast EPS.
    pub eps_forecast: Option<f64>,
    /// Actual BPS.
    pub bps_actual: Option<f64>,
    /// Forecast dividend yield, percent.
    pub dividend_yield: Option<f64>,
}

impl From<DailyFinancial> for FinancialRecord {
    fn from(r: DailyFinancial) -> Self {
        Self {
            code: r.code,
            date: r.date,
            market_cap: r.market_cap,
            per_forecast: r.per_forecast,
            pbr_actual: r.pbr_actual,
            eps_forecast: r.eps_forecast,
            bps_actual: r.bps_actual,
            dividend_yield: r.dividend_yield,
        }
    }
}

/// A row of [`crate::schema::weekly_margin`].
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = weekly_margin, primary_key(code, date))]
#[diesel(treat_none_as_null = true, check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarginRecord {
    /// Security code.
    pub code: String,
    /// Announcement date, `YYYYMMDD`.
    pub date: String,
    /// Margin sell balance.
    pub sell_balance: Option<i64>,
    /// Margin buy balance.
    pub buy_balance: Option<i64>,
    /// Buy/sell ratio.
    pub ratio: Option<f64>,
}

impl From<WeeklyMargin> for MarginRecord {
    fn from(r: WeeklyMargin) -> Self {
        Self {
            code: r.code,
            date: r.date,
            sell_balance: r.sell_balance,
            buy_balance: r.buy_balance,
            ratio: r.ratio,
        }
    }
}

/// A row of [`crate::schema::volume_profile`].
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = volume_profile, primary_key(code, analysis_date, price_band))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VolumeBandRecord {
    /// Security code.
    pub code: String,
    /// Last day of the lookback window, `YYYYMMDD`.
    pub analysis_date: String,
    /// Lower bound of the price band.
    pub price_band: f64,
    /// Shares traded while the close sat in this band.
    pub volume_sum: i64,
}

/// A row of [`crate::schema::companies`].
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = companies, primary_key(code))]
#[diesel(treat_none_as_null = true, check_for_backend(diesel::sqlite::Sqlite))]
pub struct CompanyRecord {
    /// Security code.
    pub code: String,
    /// Company name.
    pub name: Option<String>,
    /// Listing market (e.g. "東証プライム").
    pub market: Option<String>,
    /// Industry classification.
    pub industry: Option<String>,
}
