#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};
use encoding_rs::SHIFT_JIS;
use feed_ingestor::{
    models::feed::FeedKind,
    providers::{
        FeedTransport, HttpResponse, credentials::Credentials, errors::TransportError,
        kabu_plus::{FeedClient, feed_url},
        retry::RetryPolicy,
    },
};
use market_sync::{
    batch::{BatchOptions, BatchOrchestrator},
    store::Store,
};
use tempfile::TempDir;

pub const BASE_URL: &str = "http://feeds.test";

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}
#[derive(QueryableByName)]
struct Count {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

pub fn setup_store() -> (TestDb, Store) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    let store = Store::open(&path).expect("open store");
    (TestDb { _dir: dir, path }, store)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    let c: Count = diesel::sql_query(format!("SELECT COUNT(*) AS n FROM {table}"))
        .get_result(conn)
        .unwrap();
    c.n
}

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y%m%d").unwrap()
}

/// Serves canned responses by URL; anything unscripted is a 404.
#[derive(Default)]
pub struct FakeFeeds {
    responses: Mutex<HashMap<String, Vec<(u16, Vec<u8>)>>>,
    pub requested: Mutex<Vec<String>>,
}

impl FakeFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts one response for `kind` on `date`. Several calls queue up.
    pub fn serve(self, kind: FeedKind, date: &str, status: u16, body: Vec<u8>) -> Self {
        let url = feed_url(BASE_URL, kind, d(date));
        self.responses
            .lock()
            .unwrap()
            .entry(url)
            .or_default()
            .push((status, body));
        self
    }

    pub fn csv(self, kind: FeedKind, date: &str, text: &str) -> Self {
        self.serve(kind, date, 200, sjis(text))
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedTransport for FakeFeeds {
    async fn get(
        &self,
        url: &str,
        _credentials: &Credentials,
    ) -> Result<HttpResponse, TransportError> {
        self.requested.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        let next = responses.get_mut(url).and_then(|queue| {
            if queue.is_empty() {
                None
            } else {
                Some(queue.remove(0))
            }
        });
        Ok(match next {
            Some((status, body)) => HttpResponse::new(status, body),
            None => HttpResponse::new(404, Vec::new()),
        })
    }
}

pub fn sjis(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
    assert!(!had_errors, "fixture not representable in Shift_JIS");
    bytes.into_owned()
}

pub fn orchestrator(feeds: &FakeFeeds, options: BatchOptions) -> BatchOrchestrator<&FakeFeeds> {
    let client = FeedClient::new(feeds, Credentials::new("alice", "hunter2"))
        .with_base_url(BASE_URL)
        .with_retry(RetryPolicy::immediate(1));
    BatchOrchestrator::new(client, options)
}

pub fn no_pacing() -> BatchOptions {
    BatchOptions {
        pacing: std::time::Duration::ZERO,
        ..BatchOptions::default()
    }
}

pub const PRICE_HEADER: &str = "SC,名称,市場,業種,日付,株価,前日比,前日比（％）,前日終値,始値,高値,安値,VWAP,出来高";

pub fn price_csv(rows: &[&str]) -> String {
    let mut s = String::from(PRICE_HEADER);
    s.push('\n');
    for r in rows {
        s.push_str(r);
        s.push('\n');
    }
    s
}

pub const FINANCIAL_HEADER: &str = "SC,名称,市場,業種,時価総額（百万円）,発行済株式数,配当利回り（予想）,1株配当（予想）,PER（予想）,PBR（実績）,EPS（予想）,BPS（実績）,最低購入額,単元株,高値日付,年初来高値,安値日付,年初来安値";

pub fn margin_csv(rows: &[&str]) -> String {
    let mut s = String::from("東証 信用取引残高\n");
    s.push_str("SC,公表日,信用取引区分,信用売残,信用売残 前週比,信用買残,信用買残 前週比,貸借倍率,制度信用売残,制度信用売残 前週比,制度信用買残,制度信用買残 前週比,一般信用売残,一般信用売残 前週比,一般信用買残,一般信用買残 前週比\n");
    for r in rows {
        s.push_str(r);
        s.push('\n');
    }
    s
}
