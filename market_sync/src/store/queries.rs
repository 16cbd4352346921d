//! Read-side queries used by the volume profile and the analysis path.

use diesel::prelude::*;

use crate::{
    models::{CompanyRecord, FinancialRecord, PriceRecord, VolumeBandRecord},
    schema::{companies, daily_financials, daily_prices, volume_profile},
    store::StoreError,
};

/// Price rows with `from <= date <= to` (dates as `YYYYMMDD`), oldest first.
///
/// `code = None` returns every code, ordered by code then date.
pub fn prices_between(
    conn: &mut SqliteConnection,
    code: Option<&str>,
    from: &str,
    to: &str,
) -> Result<Vec<PriceRecord>, StoreError> {
    use daily_prices::dsl as dp;

    let mut query = dp::daily_prices
        .filter(dp::date.ge(from))
        .filter(dp::date.le(to))
        .select(PriceRecord::as_select())
        .order((dp::code.asc(), dp::date.asc()))
        .into_boxed();
    if let Some(code) = code {
        query = query.filter(dp::code.eq(code));
    }
    Ok(query.load(conn)?)
}

/// Up to `limit` most recent valuation snapshots of `code`, oldest first.
pub fn latest_financials(
    conn: &mut SqliteConnection,
    code: &str,
    limit: i64,
) -> Result<Vec<FinancialRecord>, StoreError> {
    use daily_financials::dsl as df;

    let mut rows: Vec<FinancialRecord> = df::daily_financials
        .filter(df::code.eq(code))
        .order(df::date.desc())
        .limit(limit)
        .select(FinancialRecord::as_select())
        .load(conn)?;
    rows.reverse();
    Ok(rows)
}

/// Master data for `code`, if any was loaded.
pub fn company(conn: &mut SqliteConnection, code: &str) -> Result<Option<CompanyRecord>, StoreError> {
    Ok(companies::table
        .find(code)
        .select(CompanyRecord::as_select())
        .first(conn)
        .optional()?)
}

/// Stored profile of `code` at `analysis_date`, lowest band first.
pub fn volume_bands(
    conn: &mut SqliteConnection,
    code: &str,
    analysis_date: &str,
) -> Result<Vec<VolumeBandRecord>, StoreError> {
    use volume_profile::dsl as vp;

    Ok(vp::volume_profile
        .filter(vp::code.eq(code))
        .filter(vp::analysis_date.eq(analysis_date))
        .order(vp::price_band.asc())
        .select(VolumeBandRecord::as_select())
        .load(conn)?)
}
