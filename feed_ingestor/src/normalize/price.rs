//! `japan-all-stock-prices-2` → [`DailyPrice`].

use chrono::NaiveDate;
use tracing::warn;

use crate::{
    models::{
        feed::FeedKind,
        raw_table::RawTable,
        rows::{DailyPrice, Normalized},
    },
    normalize::{
        ColumnMap, FeedSchema, HeaderStrategy, SchemaMismatch, normalize_code,
        values::{format_date, parse_date, parse_integer, parse_number},
    },
};

/// Price feed dictionary in `daily_prices` column order. `株価` is the last
/// traded price and is stored as `close`.
pub const PRICE_COLUMNS: &[ColumnMap] = &[
    ColumnMap::required("SC", "code"),
    ColumnMap::optional("日付", "date"),
    ColumnMap::required("始値", "open"),
    ColumnMap::required("高値", "high"),
    ColumnMap::required("安値", "low"),
    ColumnMap::required("株価", "close"),
    ColumnMap::required("出来高", "volume"),
];

/// Price feed schema; the header is trusted by name.
pub const PRICE_SCHEMA: FeedSchema = FeedSchema {
    kind: FeedKind::Price,
    header: HeaderStrategy::ByName,
    columns: PRICE_COLUMNS,
};

/// Normalizes a price table for `trading_date`.
///
/// Rows are stamped with the requested trading date; the file's own `日付`
/// column is only compared against it and a disagreement is logged.
pub fn normalize_prices(
    table: &RawTable,
    trading_date: NaiveDate,
) -> Result<Normalized<DailyPrice>, SchemaMismatch> {
    let cols = PRICE_SCHEMA.resolve(table)?;
    let date = format_date(trading_date);

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut dropped = 0;
    let mut stale = 0;

    for raw in &table.rows {
        let Some(code) = normalize_code(cols.cell(raw, "code")) else {
            dropped += 1;
            continue;
        };
        if let Ok(Some(d)) = parse_date(cols.cell(raw, "date")) {
            if d != trading_date {
                stale += 1;
            }
        }
        rows.push(DailyPrice {
            code,
            date: date.clone(),
            open: parse_number(cols.cell(raw, "open")),
            high: parse_number(cols.cell(raw, "high")),
            low: parse_number(cols.cell(raw, "low")),
            close: parse_number(cols.cell(raw, "close")),
            volume: parse_integer(cols.cell(raw, "volume")),
        });
    }

    if stale > 0 {
        warn!(date = %date, stale, "price feed rows carry a different trading date");
    }

    Ok(Normalized { rows, dropped })
}
