use chrono::NaiveDate;

use crate::models::feed::FeedKind;

/// Root of the CSV download tree.
pub const DEFAULT_BASE_URL: &str = "https://csvex.com/kabu.plus/csv";

/// `<base>/<feed-name>/<daily|weekly>/<feed-name>_<YYYYMMDD>.csv`
pub fn feed_url(base: &str, kind: FeedKind, date: NaiveDate) -> String {
    let name = kind.feed_name();
    format!(
        "{}/{name}/{}/{name}_{}.csv",
        base.trim_end_matches('/'),
        kind.cadence().as_path(),
        date.format("%Y%m%d"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn daily_price_url() {
        assert_eq!(
            feed_url(DEFAULT_BASE_URL, FeedKind::Price, d(2025, 1, 6)),
            "https://csvex.com/kabu.plus/csv/japan-all-stock-prices-2/daily/japan-all-stock-prices-2_20250106.csv"
        );
    }

    #[test]
    fn weekly_margin_url_and_trailing_slash() {
        assert_eq!(
            feed_url("http://localhost:1234/", FeedKind::Margin, d(2025, 1, 7)),
            "http://localhost:1234/tosho-stock-margin-transactions-2/weekly/tosho-stock-margin-transactions-2_20250107.csv"
        );
    }
}
