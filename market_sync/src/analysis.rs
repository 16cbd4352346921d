//! `/analyze <code>` request handling.
//!
//! Loads a year of prices plus the latest valuation snapshots for a code,
//! asks a [`ChartRenderer`] for a chart and a [`NarrativeGenerator`] for the
//! report, and answers with a single [`Reply`]. Any failure along the way
//! becomes [`Reply::Error`]; a partial report is never returned.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use diesel::SqliteConnection;
use tracing::{info, warn};

use crate::{
    calendar::format_compact,
    models::{FinancialRecord, PriceRecord},
    store::{
        StoreError,
        queries::{company, latest_financials, prices_between},
    },
};

/// Chat command prefix.
pub const COMMAND: &str = "/analyze";
/// Calendar days of price history handed to the collaborators.
pub const HISTORY_DAYS: u64 = 365;
/// Number of most recent closes averaged in the summary.
pub const AVERAGE_WINDOW: usize = 90;
/// Valuation snapshots handed to the narrative generator.
pub const FINANCIAL_SNAPSHOTS: i64 = 5;

/// The message is not a well-formed analyze command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The message is some other command or plain chat.
    #[error("not an /analyze command")]
    NotAnalyze,
    /// `/analyze` without a code.
    #[error("usage: /analyze <code> (e.g. /analyze 7203)")]
    MissingCode,
}

/// A collaborator could not do its job; carries its message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

/// Rendered chart image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chart {
    /// Encoded image bytes (PNG).
    pub image: Vec<u8>,
    /// File name to attach the image under.
    pub filename: String,
}

/// Who the report is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyIdentity {
    /// Security code.
    pub code: String,
    /// Company name; the code when no master data is loaded.
    pub name: String,
    /// Listing market, if known.
    pub market: Option<String>,
    /// Industry, if known.
    pub industry: Option<String>,
}

/// Draws a price chart from a date-ordered OHLCV series.
pub trait ChartRenderer {
    /// Renders `series` (oldest first).
    fn render(&self, series: &[PriceRecord]) -> Result<Chart, CollaboratorError>;
}

/// Writes the narrative report.
#[async_trait]
pub trait NarrativeGenerator {
    /// Produces the report text.
    async fn generate(
        &self,
        identity: &CompanyIdentity,
        summary: &str,
        series: &[PriceRecord],
        financials: &[FinancialRecord],
        image: &[u8],
    ) -> Result<String, CollaboratorError>;
}

/// Answer to an analyze request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Chart and report, sent together.
    Report {
        /// The chart attachment.
        chart: Chart,
        /// The report body.
        text: String,
    },
    /// A single plain-text error message.
    Error(String),
}

#[derive(Debug, thiserror::Error)]
enum AnalysisError {
    #[error("no price data stored for {0}")]
    NoPrices(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("chart rendering failed: {0}")]
    Chart(#[source] CollaboratorError),
    #[error("report generation failed: {0}")]
    Narrative(#[source] CollaboratorError),
}

/// Extracts the code from `/analyze <code>`.
pub fn parse_analyze_command(text: &str) -> Result<String, CommandError> {
    let mut parts = text.split_whitespace();
    if parts.next() != Some(COMMAND) {
        return Err(CommandError::NotAnalyze);
    }
    parts
        .next()
        .map(str::to_string)
        .ok_or(CommandError::MissingCode)
}

/// Latest close and the average close over the last [`AVERAGE_WINDOW`] rows.
///
/// Null closes inside the window are left out of the average. `None` when
/// the series has no close at all.
pub fn summarize(identity: &CompanyIdentity, series: &[PriceRecord]) -> Option<String> {
    let latest = series.iter().rev().find_map(|p| p.close)?;
    let rows = &series[series.len().saturating_sub(AVERAGE_WINDOW)..];
    let window: Vec<f64> = rows.iter().filter_map(|p| p.close).collect();
    let average = match window.len() {
        0 => latest,
        n => window.iter().sum::<f64>() / n as f64,
    };
    Some(format!(
        "{} ({})\nlatest close: {latest:.2} JPY\n{}-day average close: {average:.2} JPY",
        identity.name,
        identity.code,
        rows.len(),
    ))
}

/// Runs the full analysis for `code` with prices up to `as_of`.
pub async fn analyze<R, G>(
    conn: &mut SqliteConnection,
    code: &str,
    as_of: NaiveDate,
    renderer: &R,
    generator: &G,
) -> Reply
where
    R: ChartRenderer + ?Sized,
    G: NarrativeGenerator + ?Sized,
{
    match try_analyze(conn, code, as_of, renderer, generator).await {
        Ok(reply) => {
            info!(code, "analysis delivered");
            reply
        }
        Err(e) => {
            warn!(code, error = %e, "analysis failed");
            Reply::Error(e.to_string())
        }
    }
}

/// Chat entry point: `None` for messages that are not analyze commands,
/// a usage error for `/analyze` without a code, the analysis otherwise.
pub async fn handle_message<R, G>(
    conn: &mut SqliteConnection,
    text: &str,
    as_of: NaiveDate,
    renderer: &R,
    generator: &G,
) -> Option<Reply>
where
    R: ChartRenderer + ?Sized,
    G: NarrativeGenerator + ?Sized,
{
    match parse_analyze_command(text) {
        Ok(code) => Some(analyze(conn, &code, as_of, renderer, generator).await),
        Err(CommandError::NotAnalyze) => None,
        Err(e @ CommandError::MissingCode) => Some(Reply::Error(e.to_string())),
    }
}

async fn try_analyze<R, G>(
    conn: &mut SqliteConnection,
    code: &str,
    as_of: NaiveDate,
    renderer: &R,
    generator: &G,
) -> Result<Reply, AnalysisError>
where
    R: ChartRenderer + ?Sized,
    G: NarrativeGenerator + ?Sized,
{
    let to = format_compact(as_of);
    let from = as_of
        .checked_sub_days(Days::new(HISTORY_DAYS))
        .map(format_compact)
        .unwrap_or_default();

    let series = prices_between(conn, Some(code), &from, &to)?;
    let identity = identity(conn, code)?;
    let summary =
        summarize(&identity, &series).ok_or_else(|| AnalysisError::NoPrices(code.to_string()))?;
    let financials = latest_financials(conn, code, FINANCIAL_SNAPSHOTS)?;

    let chart = renderer.render(&series).map_err(AnalysisError::Chart)?;
    let text = generator
        .generate(&identity, &summary, &series, &financials, &chart.image)
        .await
        .map_err(AnalysisError::Narrative)?;

    Ok(Reply::Report { chart, text })
}

fn identity(conn: &mut SqliteConnection, code: &str) -> Result<CompanyIdentity, StoreError> {
    let master = company(conn, code)?;
    Ok(match master {
        Some(c) => CompanyIdentity {
            name: c.name.unwrap_or_else(|| code.to_string()),
            code: c.code,
            market: c.market,
            industry: c.industry,
        },
        None => CompanyIdentity {
            code: code.to_string(),
            name: code.to_string(),
            market: None,
            industry: None,
        },
    })
}
