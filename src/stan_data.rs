//! The numeric bundle handed to the inference engine.
use chrono::NaiveDate;
use log::info;
use serde::Serialize;

use crate::alignment::{self, Alignment, AlignmentIndices};
use crate::config::PrepConfig;
use crate::error::PrepError;
use crate::mitigation::MitigationTable;
use crate::series::{DailySeries, N_OSTATES};

/// Keys and shapes follow the inference engine's data block. `N` is omitted when no
/// population figure is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StanData {
    pub n_ostates: usize,
    pub tm: i64,
    pub ts: Vec<i64>,
    pub y: Vec<[i64; N_OSTATES]>,
    pub n_obs: usize,
    /// Daily mode: whole weeks in the observed window. Weekly mode: equal to `n_obs`.
    pub n_weeks: usize,
    pub n_total: usize,
    #[serde(rename = "N", skip_serializing_if = "Option::is_none")]
    pub population: Option<f64>,
}

impl StanData {
    /// Number of strictly positive observations.
    #[must_use]
    pub fn n_data(&self) -> usize {
        self.y.iter().flatten().filter(|&&count| count > 0).count()
    }

    /// Shifts `tm` and every element of `ts` by `offset` periods.
    pub fn apply_offset(&mut self, offset: i64) {
        self.tm += offset;
        for t in &mut self.ts {
            *t += offset;
        }
    }
}

/// Result of preparing a region.
#[derive(Debug, Clone, PartialEq)]
pub enum Prepared {
    NoUsableData,
    Ready {
        stan_data: StanData,
        /// Calendar date of `t0`.
        onset_date: NaiveDate,
    },
}

impl Prepared {
    #[must_use]
    pub fn stan_data(&self) -> Option<&StanData> {
        match self {
            Prepared::NoUsableData => None,
            Prepared::Ready { stan_data, .. } => Some(stan_data),
        }
    }

    #[must_use]
    pub fn n_data(&self) -> usize {
        self.stan_data().map_or(0, StanData::n_data)
    }
}

/// Whole days from `epoch` to `first_date`.
#[must_use]
pub fn daily_offset(first_date: NaiveDate, epoch: NaiveDate) -> i64 {
    (first_date - epoch).num_days()
}

/// Whole weeks from `epoch` to `first_date`, rounded down.
#[must_use]
pub fn weekly_offset(first_date: NaiveDate, epoch: NaiveDate) -> i64 {
    daily_offset(first_date, epoch).div_euclid(7)
}

/// `t0 .. end + horizon`, the observed window followed by the projection.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn time_axis(t0: usize, end: usize, horizon: usize) -> Vec<i64> {
    (t0 as i64..(end + horizon) as i64).collect()
}

/// Builds the daily bundle for an aligned series.
///
/// Returns the bundle and the calendar date of `t0`.
///
/// # Errors
///
/// Returns `PrepError::InvalidDateFormat` if `fixed_t` is set and the configured epoch is
/// malformed.
///
/// # Panics
///
/// Panics if `indices.t0` is not an index into `series`.
pub fn build_daily(
    series: &DailySeries,
    indices: AlignmentIndices,
    config: &PrepConfig,
) -> Result<(StanData, NaiveDate), PrepError> {
    let AlignmentIndices { t0, tm } = indices;
    let rows = series.rows();
    let n_obs = rows.len() - t0;
    let mut stan_data = StanData {
        n_ostates: N_OSTATES,
        tm,
        ts: time_axis(t0, rows.len(), config.horizon),
        y: rows[t0..].iter().map(|row| row.counts()).collect(),
        n_obs,
        n_weeks: n_obs / 7,
        n_total: n_obs + config.horizon,
        population: None,
    };
    if config.fixed_t {
        let offset = daily_offset(rows[0].date, config.epoch_date()?);
        stan_data.apply_offset(offset);
    }
    Ok((stan_data, rows[t0].date))
}

/// Aligns `series` and builds the daily bundle.
///
/// # Errors
///
/// See [`build_daily`].
pub fn prepare_daily(
    series: &DailySeries,
    region: &str,
    mitigation: &MitigationTable,
    config: &PrepConfig,
) -> Result<Prepared, PrepError> {
    match alignment::resolve(series, region, mitigation, config) {
        Alignment::NoUsableData => {
            info!("{region}: no day reaches {} new cases", config.onset_threshold);
            Ok(Prepared::NoUsableData)
        }
        Alignment::Resolved(indices) => {
            let (stan_data, onset_date) = build_daily(series, indices, config)?;
            Ok(Prepared::Ready {
                stan_data,
                onset_date,
            })
        }
    }
}
