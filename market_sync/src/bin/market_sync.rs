use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feed_ingestor::providers::{
    credentials::Credentials, http::ReqwestTransport, kabu_plus::FeedClient,
};
use market_sync::{
    batch::BatchOrchestrator,
    calendar::{format_compact, parse_compact, today_jst, window_ending},
    config::{Settings, load_settings_path},
    store::{Store, queries::volume_bands},
    volume_profile::compute_volume_profile,
};
use tracing::info;

/// Days ingested when no range is given.
const DEFAULT_WINDOW_DAYS: u32 = 14;

#[derive(Parser)]
#[command(version, about = "kabu-plus feed ingestion into SQLite")]
struct Cli {
    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create the database and its tables.
    InitDb,
    /// Download and store every feed for a date range.
    Ingest {
        /// First date, YYYYMMDD. Defaults to 14 days before --end.
        #[arg(long)]
        start: Option<String>,
        /// Last date, YYYYMMDD. Defaults to today in Japan.
        #[arg(long)]
        end: Option<String>,
    },
    /// Recompute and print the volume profile of one code.
    VolumeProfile {
        /// Security code.
        #[arg(long)]
        code: String,
        /// Analysis date, YYYYMMDD. Defaults to today in Japan.
        #[arg(long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    shared_utils::logging::init_tracing(&cli.log_level);

    let settings = load_settings(cli.config.as_deref())?;

    match cli.cmd {
        Cmd::InitDb => {
            let store = open_store(&settings)?;
            println!("database initialised at {}", store.database_url());
        }
        Cmd::Ingest { start, end } => {
            let end = match end {
                Some(s) => parse_compact(&s)?,
                None => today_jst(),
            };
            let start = match start {
                Some(s) => parse_compact(&s)?,
                None => window_ending(end, DEFAULT_WINDOW_DAYS).0,
            };

            let credentials = Credentials::from_env()?;
            let transport =
                ReqwestTransport::new(settings.feed.timeout(), &settings.feed.user_agent)?;
            let client = FeedClient::new(transport, credentials)
                .with_base_url(settings.feed.base_url.clone())
                .with_retry(settings.feed.retry.policy());
            let orchestrator = BatchOrchestrator::new(client, settings.batch.options());

            let mut store = open_store(&settings)?;
            let report = orchestrator
                .run(&mut store, start, end)
                .await
                .context("batch run aborted; nothing was committed")?;

            for (date, feed, reason) in report.failures() {
                eprintln!("{} {feed}: {reason}", format_compact(date));
            }
            println!(
                "{} trading days, {} weekend days skipped, {} rows written",
                report.days.len(),
                report.weekend_days_skipped,
                report.rows_written()
            );
        }
        Cmd::VolumeProfile { code, date } => {
            let date = match date {
                Some(s) => parse_compact(&s)?,
                None => today_jst(),
            };
            let params = settings.batch.volume_profile.params();
            let mut store = open_store(&settings)?;
            let written = store.with_session::<_, anyhow::Error, _>(|conn| {
                Ok(compute_volume_profile(conn, Some(code.as_str()), date, params)?)
            })?;
            info!(%code, bands = written, "volume profile computed");

            for band in volume_bands(store.connection(), &code, &format_compact(date))? {
                println!("{:>12.2}  {:>14}", band.price_band, band.volume_sum);
            }
        }
    }

    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(p) => load_settings_path(p)?,
        None => Settings::default(),
    };
    settings.apply_env();
    Ok(settings)
}

fn open_store(settings: &Settings) -> Result<Store> {
    let url = &settings.database_url;
    if let Some(parent) = Path::new(url).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create database directory {}", parent.display()))?;
    }
    Store::open(url).with_context(|| format!("open database {url}"))
}
