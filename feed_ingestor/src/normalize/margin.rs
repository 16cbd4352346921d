//! `tosho-stock-margin-transactions-2` → [`WeeklyMargin`].
//!
//! The header line of this file does not survive decoding, so names are
//! assigned from [`MARGIN_TEMPLATE`] by position once the width matches.

use crate::{
    models::{
        feed::FeedKind,
        raw_table::RawTable,
        rows::{Normalized, WeeklyMargin},
    },
    normalize::{
        ColumnMap, FeedSchema, HeaderStrategy, SchemaMismatch, normalize_code,
        values::{format_date, parse_date, parse_integer, parse_number},
    },
};

/// Column layout of the margin file, in file order.
pub const MARGIN_TEMPLATE: &[&str] = &[
    "SC",
    "公表日",
    "信用取引区分",
    "信用売残",
    "信用売残 前週比",
    "信用買残",
    "信用買残 前週比",
    "貸借倍率",
    "制度信用売残",
    "制度信用売残 前週比",
    "制度信用買残",
    "制度信用買残 前週比",
    "一般信用売残",
    "一般信用売残 前週比",
    "一般信用買残",
    "一般信用買残 前週比",
];

pub const MARGIN_COLUMNS: &[ColumnMap] = &[
    ColumnMap::required("SC", "code"),
    ColumnMap::required("公表日", "date"),
    ColumnMap::required("信用売残", "sell_balance"),
    ColumnMap::required("信用買残", "buy_balance"),
    ColumnMap::required("貸借倍率", "ratio"),
];

pub const MARGIN_SCHEMA: FeedSchema = FeedSchema {
    kind: FeedKind::Margin,
    header: HeaderStrategy::Positional {
        template: MARGIN_TEMPLATE,
    },
    columns: MARGIN_COLUMNS,
};

/// Normalizes a margin table. Rows are dated by their own announcement date.
///
/// A blank code or blank date drops the row; a date in an unknown format
/// rejects the whole file.
pub fn normalize_margin(table: &RawTable) -> Result<Normalized<WeeklyMargin>, SchemaMismatch> {
    let cols = MARGIN_SCHEMA.resolve(table)?;

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut dropped = 0;

    for (i, raw) in table.rows.iter().enumerate() {
        let Some(code) = normalize_code(cols.cell(raw, "code")) else {
            dropped += 1;
            continue;
        };
        let date_cell = cols.cell(raw, "date");
        let date = match parse_date(date_cell) {
            Ok(Some(d)) => format_date(d),
            Ok(None) => {
                dropped += 1;
                continue;
            }
            Err(_) => {
                return Err(SchemaMismatch::DateFormat {
                    feed: FeedKind::Margin,
                    row: i + 1,
                    value: date_cell.to_string(),
                });
            }
        };
        rows.push(WeeklyMargin {
            code,
            date,
            sell_balance: parse_integer(cols.cell(raw, "sell_balance")),
            buy_balance: parse_integer(cols.cell(raw, "buy_balance")),
            ratio: parse_number(cols.cell(raw, "ratio")),
        });
    }

    Ok(Normalized { rows, dropped })
}
