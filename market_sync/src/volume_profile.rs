//! Volume-at-price profile derived from stored daily prices.
//!
//! Each day's volume is credited to the band its close falls in:
//! `band = floor(close / band_width) * band_width`. A profile is keyed by
//! `(code, analysis_date)` and recomputing it replaces the stored bands.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use diesel::prelude::*;
use tracing::debug;

use crate::{
    calendar::format_compact,
    models::{PriceRecord, VolumeBandRecord},
    schema::volume_profile,
    store::{StoreError, queries::prices_between, upsert},
};

/// Band width and lookback of a profile computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileParams {
    /// Calendar days before `analysis_date` included in the window.
    pub lookback_days: u32,
    /// Width of one price band, in yen. Must be positive and finite.
    pub band_width: f64,
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self {
            lookback_days: 365,
            band_width: 10.0,
        }
    }
}

/// Computes and stores the profile of `code` (or of every code with prices
/// in the window when `None`) as of `analysis_date`.
///
/// Rows without a close or a volume are ignored. Returns the number of bands
/// written.
pub fn compute_volume_profile(
    conn: &mut SqliteConnection,
    code: Option<&str>,
    analysis_date: NaiveDate,
    params: ProfileParams,
) -> Result<usize, StoreError> {
    if !(params.band_width.is_finite() && params.band_width > 0.0) {
        return Err(StoreError::InvalidArgument(format!(
            "band width must be positive, got {}",
            params.band_width
        )));
    }

    let to = format_compact(analysis_date);
    let from = analysis_date
        .checked_sub_days(Days::new(params.lookback_days.into()))
        .map(format_compact)
        .unwrap_or_default();

    // Clear the key first so a code whose window lost every usable row
    // ends up with no bands rather than its previous ones.
    {
        use volume_profile::dsl as vp;
        let stale = vp::volume_profile.filter(vp::analysis_date.eq(&to));
        let removed = match code {
            Some(c) => diesel::delete(stale.filter(vp::code.eq(c))).execute(conn)?,
            None => diesel::delete(stale).execute(conn)?,
        };
        debug!(analysis_date = %to, removed, "previous volume bands cleared");
    }

    let prices = prices_between(conn, code, &from, &to)?;
    let profiles = bucket(&prices, params.band_width);

    let mut written = 0;
    for (code, bands) in profiles {
        let records: Vec<VolumeBandRecord> = bands
            .into_iter()
            .map(|(index, volume_sum)| VolumeBandRecord {
                code: code.to_string(),
                analysis_date: to.clone(),
                price_band: index as f64 * params.band_width,
                volume_sum,
            })
            .collect();

        written += upsert(conn, &records)?;
        debug!(code, analysis_date = %to, bands = records.len(), "volume profile stored");
    }
    Ok(written)
}

/// Band index to summed volume, per code.
fn bucket(prices: &[PriceRecord], band_width: f64) -> BTreeMap<&str, BTreeMap<i64, i64>> {
    let mut out: BTreeMap<&str, BTreeMap<i64, i64>> = BTreeMap::new();
    for p in prices {
        let (Some(close), Some(volume)) = (p.close, p.volume) else {
            continue;
        };
        let index = (close / band_width).floor() as i64;
        *out.entry(p.code.as_str())
            .or_default()
            .entry(index)
            .or_default() += volume;
    }
    out
}
