//! Trading calendar helpers.
//!
//! A trading day is any weekday; exchange holidays are not modelled, so a
//! holiday simply comes back as "not published" from the feeds.

use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};
use chrono_tz::Asia::Tokyo;

/// A date argument that is not a valid `YYYYMMDD` date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a YYYYMMDD date, got {0:?}")]
pub struct InvalidDate(pub String);

/// Inclusive calendar walk from `start` to `end` split into trading days and
/// the number of weekend days passed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWalk {
    /// Weekdays in ascending order.
    pub trading_days: Vec<NaiveDate>,
    /// Saturdays and Sundays skipped.
    pub weekend_days: usize,
}

/// Whether the exchange can have traded on `date`.
pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Walks `start..=end`. An inverted range is empty.
pub fn walk(start: NaiveDate, end: NaiveDate) -> DateWalk {
    let mut out = DateWalk {
        trading_days: Vec::new(),
        weekend_days: 0,
    };
    for date in start.iter_days().take_while(|d| *d <= end) {
        if is_trading_day(date) {
            out.trading_days.push(date);
        } else {
            out.weekend_days += 1;
        }
    }
    out
}

/// Parses a strict `YYYYMMDD` date.
pub fn parse_compact(s: &str) -> Result<NaiveDate, InvalidDate> {
    let s = s.trim();
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| InvalidDate(s.to_string()))
}

/// Formats `date` as `YYYYMMDD`.
pub fn format_compact(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Today's date on the exchange's wall clock.
pub fn today_jst() -> NaiveDate {
    Utc::now().with_timezone(&Tokyo).date_naive()
}

/// The `days`-long window ending on (and including) `end`.
pub fn window_ending(end: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let back = u64::from(days.saturating_sub(1));
    let start = end.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
    (start, end)
}
