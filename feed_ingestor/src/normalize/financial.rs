//! `japan-all-stock-data` → [`DailyFinancial`].

use chrono::NaiveDate;

use crate::{
    models::{
        feed::FeedKind,
        raw_table::RawTable,
        rows::{DailyFinancial, Normalized},
    },
    normalize::{
        ColumnMap, FeedSchema, HeaderStrategy, SchemaMismatch, normalize_code,
        values::{format_date, parse_number},
    },
};

pub const FINANCIAL_COLUMNS: &[ColumnMap] = &[
    ColumnMap::required("SC", "code"),
    ColumnMap::required("時価総額（百万円）", "market_cap"),
    ColumnMap::required("PER（予想）", "per_forecast"),
    ColumnMap::required("PBR（実績）", "pbr_actual"),
    ColumnMap::required("EPS（予想）", "eps_forecast"),
    ColumnMap::required("BPS（実績）", "bps_actual"),
    ColumnMap::required("配当利回り（予想）", "dividend_yield"),
];

pub const FINANCIAL_SCHEMA: FeedSchema = FeedSchema {
    kind: FeedKind::Financial,
    header: HeaderStrategy::ByName,
    columns: FINANCIAL_COLUMNS,
};

/// Normalizes a valuation table; every row is dated `snapshot_date`.
pub fn normalize_financials(
    table: &RawTable,
    snapshot_date: NaiveDate,
) -> Result<Normalized<DailyFinancial>, SchemaMismatch> {
    let cols = FINANCIAL_SCHEMA.resolve(table)?;
    let date = format_date(snapshot_date);

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut dropped = 0;

    for raw in &table.rows {
        let Some(code) = normalize_code(cols.cell(raw, "code")) else {
            dropped += 1;
            continue;
        };
        let num = |canonical: &str| parse_number(cols.cell(raw, canonical));
        rows.push(DailyFinancial {
            code,
            date: date.clone(),
            market_cap: num("market_cap"),
            per_forecast: num("per_forecast"),
            pbr_actual: num("pbr_actual"),
            eps_forecast: num("eps_forecast"),
            bps_actual: num("bps_actual"),
            dividend_yield: num("dividend_yield"),
        });
    }

    Ok(Normalized { rows, dropped })
}
