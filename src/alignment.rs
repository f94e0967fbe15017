//! Onset and mitigation indices of a daily series.
//!
//! `t0` is the first day with at least `onset_threshold` new cases; the series handed to the
//! inference engine starts there. `tm` is the index of the known mitigation start for the
//! region, or `t0 + mitigation_fallback` when it is not known. Both are indices into the
//! (cutoff) daily series; `tm` is not clamped.
use chrono::NaiveDate;
use log::trace;

use crate::config::PrepConfig;
use crate::error::PrepError;
use crate::lookup::Lookup;
use crate::mitigation::{MitigationFallback, MitigationTable};
use crate::series::{parse_date, DailySeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentIndices {
    pub t0: usize,
    pub tm: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// No day reaches the onset threshold; the region has nothing to fit.
    NoUsableData,
    Resolved(AlignmentIndices),
}

/// Parses an optional `MM/DD/YY` cutoff.
///
/// # Errors
///
/// Returns `PrepError::InvalidDateFormat` if `cutoff` is malformed.
pub fn parse_cutoff(cutoff: Option<&str>) -> Result<Option<NaiveDate>, PrepError> {
    cutoff.map(parse_date).transpose()
}

/// Drops the rows after `cutoff`, if one is given. The cutoff is parsed before the series is
/// touched.
///
/// # Errors
///
/// Returns `PrepError::InvalidDateFormat` if `cutoff` is malformed.
pub fn apply_cutoff(series: DailySeries, cutoff: Option<&str>) -> Result<DailySeries, PrepError> {
    Ok(match parse_cutoff(cutoff)? {
        Some(last) => series.retain_through(last),
        None => series,
    })
}

/// Resolves `tm` from a mitigation lookup, falling back to `t0 + mitigation_fallback`.
#[allow(clippy::cast_possible_wrap)]
pub fn resolve_tm(
    lookup: Lookup<usize, MitigationFallback>,
    t0: usize,
    config: &PrepConfig,
) -> i64 {
    lookup
        .map(|tm| tm as i64)
        .or_fallback(|_| t0 as i64 + config.mitigation_fallback)
}

/// Computes the onset and mitigation indices of `series` for `region`.
pub fn resolve(
    series: &DailySeries,
    region: &str,
    mitigation: &MitigationTable,
    config: &PrepConfig,
) -> Alignment {
    let Some(t0) = series.onset_index(config.onset_threshold) else {
        return Alignment::NoUsableData;
    };
    let axis: Vec<NaiveDate> = series.dates().collect();
    let tm = resolve_tm(mitigation.lookup(region, &axis), t0, config);
    trace!("{region}: t0={t0}, tm={tm}");
    Alignment::Resolved(AlignmentIndices { t0, tm })
}
