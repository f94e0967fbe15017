//! Preparing one region end to end: load, cut off, align, bundle.
use std::path::Path;

use log::{debug, info};

use crate::alignment::{apply_cutoff, parse_cutoff};
use crate::config::{PrepConfig, PrepMode};
use crate::error::PrepError;
use crate::init::InitProvider;
use crate::mitigation::MitigationTable;
use crate::series::DailySeries;
use crate::stan_data::{prepare_daily, Prepared};
use crate::warm_start::SampleCsvSource;
use crate::weekly::prepare_weekly;

/// Prepares an already loaded series for `region` in the configured mode.
///
/// # Errors
///
/// Returns `PrepError::InvalidDateFormat` if `cutoff` or the configured epoch is malformed.
pub fn prepare_series(
    series: DailySeries,
    region: &str,
    cutoff: Option<&str>,
    mitigation: &MitigationTable,
    config: &PrepConfig,
) -> Result<Prepared, PrepError> {
    let series = apply_cutoff(series, cutoff)?;
    debug!("{region}: {} days after cutoff", series.len());
    let prepared = match config.mode {
        PrepMode::Daily => prepare_daily(&series, region, mitigation, config)?,
        PrepMode::Weekly => prepare_weekly(&series, region, mitigation, config)?,
    };
    if let Prepared::Ready { onset_date, .. } = &prepared {
        info!("{region}: data prepared from {}", onset_date.format("%m/%d/%y"));
    }
    Ok(prepared)
}

/// Reads the daily table at `series_path` and the mitigation table under `data_path`, then
/// prepares `region`.
///
/// # Errors
///
/// Returns `PrepError::InvalidDateFormat` if `cutoff` is malformed (checked before anything
/// is read), or any error from reading the daily table.
pub fn prepare_region(
    series_path: &Path,
    region: &str,
    cutoff: Option<&str>,
    config: &PrepConfig,
) -> Result<Prepared, PrepError> {
    parse_cutoff(cutoff)?;
    let series = DailySeries::from_path(series_path)?;
    let mitigation = MitigationTable::load(&config.mitigation_table_path());
    prepare_series(series, region, cutoff, &mitigation, config)
}

/// An initializer for `prepared`, trying the terminal sample of `fit_id` from
/// `fits_path` first when one is given.
///
/// Returns `None` when the region has no usable data.
///
/// # Errors
///
/// Returns `PrepError::InvalidPrior` if the configured priors are invalid.
pub fn init_provider(
    prepared: &Prepared,
    config: &PrepConfig,
    fit_id: Option<&str>,
    model_id: &str,
) -> Result<Option<InitProvider>, PrepError> {
    let Some(stan_data) = prepared.stan_data() else {
        return Ok(None);
    };
    let provider = InitProvider::new(stan_data, config)?;
    Ok(Some(match fit_id {
        Some(fit_id) => {
            provider.with_warm_start(SampleCsvSource::from_config(config), fit_id, model_id)
        }
        None => provider,
    }))
}
