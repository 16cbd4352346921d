mod common;
use common::{
    FINANCIAL_HEADER, FakeFeeds, count, d, margin_csv, no_pacing, orchestrator, price_csv,
    setup_store,
};

use std::time::Duration;

use diesel::prelude::*;
use feed_ingestor::{models::feed::FeedKind, normalize::SchemaMismatch};
use market_sync::{
    batch::{BatchOptions, FailReason, FeedStatus, SkipReason},
    models::{FinancialRecord, MarginRecord, PriceRecord},
    schema::{daily_financials, daily_prices, weekly_margin},
    store::queries::volume_bands,
    volume_profile::ProfileParams,
};

const TOYOTA: &str = "7203,トヨタ自動車,東証P,輸送用機器,20250106,1530,30,2.0,1500,1500,1550,1480,1520,200000";
const SUSPENDED: &str = "9999,休止中,東証S,サービス業,20250106,-,-,-,-,-,-,-,-,-";

#[tokio::test]
async fn toyota_price_row_lands_in_daily_prices() {
    let feeds = FakeFeeds::new().csv(FeedKind::Price, "20250106", &price_csv(&[TOYOTA, SUSPENDED]));
    let (_db, mut store) = setup_store();

    let report = orchestrator(&feeds, no_pacing())
        .run(&mut store, d("20250106"), d("20250106"))
        .await
        .unwrap();

    assert_eq!(
        report.outcome(d("20250106"), FeedKind::Price),
        Some(&FeedStatus::Inserted { rows: 2, dropped: 0 })
    );

    let rows: Vec<PriceRecord> = daily_prices::table
        .select(PriceRecord::as_select())
        .order(daily_prices::code.asc())
        .load(store.connection())
        .unwrap();
    assert_eq!(
        rows[0],
        PriceRecord {
            code: "7203".into(),
            date: "20250106".into(),
            open: Some(1500.0),
            high: Some(1550.0),
            low: Some(1480.0),
            close: Some(1530.0),
            volume: Some(200_000),
        }
    );
    assert_eq!(rows[1].code, "9999");
    assert_eq!(rows[1].close, None);
    assert_eq!(rows[1].volume, None);
}

#[tokio::test]
async fn missing_files_are_skipped_and_others_still_land() {
    let fin = format!(
        "{FINANCIAL_HEADER}\n7203,トヨタ自動車,東証P,輸送用機器,45000000,1,2.8,90,9.5,1.1,300.5,2800,153000,100,20240301,3891,20240805,2400\n"
    );
    let feeds = FakeFeeds::new()
        .csv(FeedKind::Price, "20250106", &price_csv(&[TOYOTA]))
        .csv(FeedKind::Financial, "20250106", &fin);
    let (_db, mut store) = setup_store();

    let report = orchestrator(&feeds, no_pacing())
        .run(&mut store, d("20250106"), d("20250106"))
        .await
        .unwrap();

    assert_eq!(
        report.outcome(d("20250106"), FeedKind::Margin),
        Some(&FeedStatus::Skipped(SkipReason::NotFound))
    );
    assert_eq!(report.rows_written(), 2);
    assert_eq!(report.failures().count(), 0);

    let fin: FinancialRecord = daily_financials::table
        .select(FinancialRecord::as_select())
        .first(store.connection())
        .unwrap();
    assert_eq!(fin.date, "20250106");
    assert_eq!(fin.market_cap, Some(45_000_000.0));
    assert_eq!(fin.per_forecast, Some(9.5));
    assert_eq!(fin.dividend_yield, Some(2.8));
}

#[tokio::test]
async fn schema_mismatch_is_isolated_to_its_feed() {
    let bad_price = "SC,名称,終値\n7203,トヨタ自動車,1530\n";
    let margin = margin_csv(&["7203,2025/01/10,合計,300,1,500,2,1.67,0,0,0,0,0,0,0,0"]);
    let feeds = FakeFeeds::new()
        .csv(FeedKind::Price, "20250110", bad_price)
        .csv(FeedKind::Margin, "20250110", &margin);
    let (_db, mut store) = setup_store();

    let report = orchestrator(&feeds, no_pacing())
        .run(&mut store, d("20250110"), d("20250110"))
        .await
        .unwrap();

    assert!(matches!(
        report.outcome(d("20250110"), FeedKind::Price),
        Some(FeedStatus::Skipped(SkipReason::SchemaMismatch(
            SchemaMismatch::MissingColumn { .. }
        )))
    ));
    assert_eq!(count(store.connection(), "daily_prices"), 0);

    let m: MarginRecord = weekly_margin::table
        .select(MarginRecord::as_select())
        .first(store.connection())
        .unwrap();
    assert_eq!(m.date, "20250110");
    assert_eq!(m.sell_balance, Some(300));
    assert_eq!(m.buy_balance, Some(500));
    assert_eq!(m.ratio, Some(1.67));
}

#[tokio::test]
async fn margin_with_wrong_width_is_a_mismatch() {
    let feeds = FakeFeeds::new().csv(FeedKind::Margin, "20250110", "title\nSC,公表日\n7203,20250110\n");
    let (_db, mut store) = setup_store();

    let report = orchestrator(&feeds, no_pacing())
        .run(&mut store, d("20250110"), d("20250110"))
        .await
        .unwrap();

    assert_eq!(
        report.outcome(d("20250110"), FeedKind::Margin),
        Some(&FeedStatus::Skipped(SkipReason::SchemaMismatch(
            SchemaMismatch::ColumnCount {
                feed: FeedKind::Margin,
                expected: 16,
                found: 2,
            }
        )))
    );
}

#[tokio::test]
async fn bad_margin_width_leaves_price_and_financial_intact() {
    let fin = format!(
        "{FINANCIAL_HEADER}\n7203,トヨタ自動車,東証P,輸送用機器,45000000,1,2.8,90,9.5,1.1,300.5,2800,153000,100,20240301,3891,20240805,2400\n"
    );
    let feeds = FakeFeeds::new()
        .csv(FeedKind::Price, "20250106", &price_csv(&[TOYOTA]))
        .csv(FeedKind::Financial, "20250106", &fin)
        .csv(FeedKind::Margin, "20250106", "title\nSC,公表日\n7203,20250106\n");
    let (_db, mut store) = setup_store();

    let report = orchestrator(&feeds, no_pacing())
        .run(&mut store, d("20250106"), d("20250106"))
        .await
        .unwrap();

    let date = d("20250106");
    assert_eq!(
        report.outcome(date, FeedKind::Price),
        Some(&FeedStatus::Inserted { rows: 1, dropped: 0 })
    );
    assert_eq!(
        report.outcome(date, FeedKind::Financial),
        Some(&FeedStatus::Inserted { rows: 1, dropped: 0 })
    );
    assert!(matches!(
        report.outcome(date, FeedKind::Margin),
        Some(FeedStatus::Skipped(SkipReason::SchemaMismatch(
            SchemaMismatch::ColumnCount { expected: 16, found: 2, .. }
        )))
    ));

    let conn = store.connection();
    assert_eq!(count(conn, "daily_prices"), 1);
    assert_eq!(count(conn, "daily_financials"), 1);
    assert_eq!(count(conn, "weekly_margin"), 0);
}

#[tokio::test]
async fn exhausted_retries_and_bad_encoding_are_distinct_skips() {
    let feeds = FakeFeeds::new()
        .serve(FeedKind::Price, "20250106", 503, Vec::new())
        .serve(FeedKind::Price, "20250106", 503, Vec::new())
        .serve(FeedKind::Financial, "20250106", 200, b"SC,\x93".to_vec())
        .csv(FeedKind::Price, "20250107", &price_csv(&[TOYOTA]));
    let (_db, mut store) = setup_store();

    let report = orchestrator(&feeds, no_pacing())
        .run(&mut store, d("20250106"), d("20250107"))
        .await
        .unwrap();

    assert_eq!(
        report.outcome(d("20250106"), FeedKind::Price),
        Some(&FeedStatus::Skipped(SkipReason::Transient {
            attempts: 2,
            last: "HTTP 503".into(),
        }))
    );
    assert_eq!(
        report.outcome(d("20250106"), FeedKind::Financial),
        Some(&FeedStatus::Skipped(SkipReason::Decode))
    );
    assert_eq!(report.failures().count(), 0);

    // The next date is still fetched in full.
    let next_day: Vec<_> = feeds
        .requested()
        .into_iter()
        .filter(|url| url.ends_with("_20250107.csv"))
        .collect();
    assert_eq!(next_day.len(), 3);
    assert_eq!(
        report.outcome(d("20250107"), FeedKind::Price),
        Some(&FeedStatus::Inserted { rows: 1, dropped: 0 })
    );
}

#[tokio::test]
async fn weekends_never_reach_the_provider() {
    let feeds = FakeFeeds::new();
    let (_db, mut store) = setup_store();

    // Sat 2025-01-04 and Sun 2025-01-05 only.
    let report = orchestrator(&feeds, no_pacing())
        .run(&mut store, d("20250104"), d("20250105"))
        .await
        .unwrap();

    assert!(report.days.is_empty());
    assert_eq!(report.weekend_days_skipped, 2);
    assert!(feeds.requested().is_empty());
}

#[tokio::test]
async fn every_feed_is_attempted_per_trading_day_in_order() {
    let feeds = FakeFeeds::new();
    let (_db, mut store) = setup_store();

    // Fri 2025-01-03 .. Mon 2025-01-06
    let report = orchestrator(&feeds, no_pacing())
        .run(&mut store, d("20250103"), d("20250106"))
        .await
        .unwrap();

    let dates: Vec<_> = report.days.iter().map(|day| day.date).collect();
    assert_eq!(dates, vec![d("20250103"), d("20250106")]);

    let requested = feeds.requested();
    assert_eq!(requested.len(), 6);
    assert!(requested[0].ends_with("japan-all-stock-prices-2_20250103.csv"));
    assert!(requested[1].ends_with("japan-all-stock-data_20250103.csv"));
    assert!(requested[2].ends_with("tosho-stock-margin-transactions-2_20250103.csv"));
    assert!(requested[3].ends_with("japan-all-stock-prices-2_20250106.csv"));
}

#[tokio::test]
async fn auth_failure_is_reported_and_other_feeds_continue() {
    let feeds = FakeFeeds::new()
        .serve(FeedKind::Price, "20250106", 401, Vec::new())
        .csv(FeedKind::Margin, "20250106", &margin_csv(&["7203,20250110,合計,1,0,2,0,2.0,0,0,0,0,0,0,0,0"]));
    let (_db, mut store) = setup_store();

    let report = orchestrator(&feeds, no_pacing())
        .run(&mut store, d("20250106"), d("20250106"))
        .await
        .unwrap();

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(
        failures,
        vec![(d("20250106"), FeedKind::Price, &FailReason::Auth { status: 401 })]
    );
    assert_eq!(count(store.connection(), "weekly_margin"), 1);
}

#[tokio::test]
async fn store_failure_mid_run_commits_nothing() {
    let feeds = FakeFeeds::new()
        .csv(FeedKind::Price, "20250106", &price_csv(&[TOYOTA]))
        .csv(
            FeedKind::Price,
            "20250107",
            &price_csv(&["7203,トヨタ自動車,東証P,輸送用機器,20250107,1540,10,0.6,1530,1530,1545,1525,1538,180000"]),
        );
    let (_db, mut store) = setup_store();
    diesel::sql_query(
        "CREATE TRIGGER fail_second_day BEFORE INSERT ON daily_prices
         WHEN NEW.date = '20250107'
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .execute(store.connection())
    .unwrap();

    let result = orchestrator(&feeds, no_pacing())
        .run(&mut store, d("20250106"), d("20250107"))
        .await;

    assert!(result.is_err(), "store errors abort the run");
    assert_eq!(count(store.connection(), "daily_prices"), 0, "day one must be rolled back");
}

#[tokio::test]
async fn rerunning_a_range_does_not_duplicate() {
    let feeds = FakeFeeds::new()
        .csv(FeedKind::Price, "20250106", &price_csv(&[TOYOTA]))
        .csv(FeedKind::Price, "20250106", &price_csv(&[TOYOTA]));
    let (_db, mut store) = setup_store();
    let orch = orchestrator(&feeds, no_pacing());

    orch.run(&mut store, d("20250106"), d("20250106")).await.unwrap();
    orch.run(&mut store, d("20250106"), d("20250106")).await.unwrap();

    assert_eq!(count(store.connection(), "daily_prices"), 1);
}

#[tokio::test(start_paused = true)]
async fn pacing_separates_dates_but_not_the_last_one() {
    let feeds = FakeFeeds::new();
    let (_db, mut store) = setup_store();
    let options = BatchOptions {
        pacing: Duration::from_millis(1500),
        ..BatchOptions::default()
    };

    let started = tokio::time::Instant::now();
    // Mon..Wed: three trading days, two gaps.
    orchestrator(&feeds, options)
        .run(&mut store, d("20250106"), d("20250108"))
        .await
        .unwrap();

    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(3000), "waited {waited:?}");
    assert!(waited < Duration::from_millis(4500), "waited {waited:?}");
}

#[tokio::test]
async fn volume_profile_is_refreshed_for_priced_codes() {
    let feeds = FakeFeeds::new()
        .csv(FeedKind::Price, "20250106", &price_csv(&[TOYOTA]))
        .csv(
            FeedKind::Price,
            "20250107",
            &price_csv(&["7203,トヨタ自動車,東証P,輸送用機器,20250107,1535,5,0.3,1530,1530,1545,1525,1538,100000"]),
        );
    let (_db, mut store) = setup_store();
    let options = BatchOptions {
        volume_profile: Some(ProfileParams {
            lookback_days: 30,
            band_width: 10.0,
        }),
        ..no_pacing()
    };

    let report = orchestrator(&feeds, options)
        .run(&mut store, d("20250106"), d("20250107"))
        .await
        .unwrap();

    assert_eq!(report.volume_bands, 1);
    let bands = volume_bands(store.connection(), "7203", "20250107").unwrap();
    assert_eq!(bands.len(), 1);
    assert_eq!(bands[0].price_band, 1530.0);
    assert_eq!(bands[0].volume_sum, 300_000);
}
