//! Cell-level conversions. Anything that is not a finite number becomes `None`.

use chrono::NaiveDate;

/// Parses a decimal cell. Blank, `-`, text, NaN and infinities map to `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    let s = cell.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses an integer cell. Decimal notation ("200000.0") is accepted and
/// rounded; values outside the `i64` range map to `None`.
pub fn parse_integer(cell: &str) -> Option<i64> {
    let s = cell.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let v = parse_number(s)?.round();
    (v >= i64::MIN as f64 && v < i64::MAX as f64).then_some(v as i64)
}

/// Parses a date cell in one of the formats the provider is known to use:
/// `YYYYMMDD`, `YYYY/MM/DD` or `YYYY-MM-DD`.
///
/// Returns `Ok(None)` for a blank cell and [`UnrecognisedDate`] for anything
/// else that does not match, so a silent format change upstream surfaces as
/// an error instead of a wrong date.
pub fn parse_date(cell: &str) -> Result<Option<NaiveDate>, UnrecognisedDate> {
    let s = cell.trim();
    if s.is_empty() {
        return Ok(None);
    }
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return compact_date(s).map(Some).ok_or(UnrecognisedDate);
    }
    for fmt in ["%Y/%m/%d", "%Y-%m-%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Some(d));
        }
    }
    Err(UnrecognisedDate)
}

/// A non-blank date cell in none of the accepted formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnrecognisedDate;

/// Formats a date in the canonical storage form.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn compact_date(s: &str) -> Option<NaiveDate> {
    let y = s.get(0..4)?.parse().ok()?;
    let m = s.get(4..6)?.parse().ok()?;
    let d = s.get(6..8)?.parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}
