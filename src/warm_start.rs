//! Recovering the terminal sample of a previous fit.
//!
//! Where previous fits live is up to the implementor of [`WarmStartSource`]. The provided
//! [`SampleCsvSource`] reads sampler output tables: one CSV per fit under `fits_path`, one
//! column per parameter, one row per draw, with `#` comment lines allowed. The last row is
//! the terminal sample. The model must also exist under `models_path`, so a sample is never
//! reused for a model it was not drawn from.
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::path::PathBuf;

use log::debug;

use crate::config::PrepConfig;
use crate::error::PrepError;
use crate::lookup::Lookup;
use crate::params::{ParamName, ParameterVector};

pub trait WarmStartSource {
    /// Returns the terminal sample of the fit `fit_id` of model `model_id`.
    ///
    /// # Errors
    ///
    /// Returns a `PrepError` if the fit or model is absent or the sample is incompatible.
    fn last_sample(&self, fit_id: &str, model_id: &str) -> Result<ParameterVector, PrepError>;
}

/// A previous fit could not be used as a starting point.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmStartUnavailable {
    pub fit_id: String,
    pub model_id: String,
    pub reason: String,
}

impl Display for WarmStartUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Couldn't use last sample from previous fit {} of {} to initialize: {}",
            self.fit_id, self.model_id, self.reason
        )
    }
}

/// Single attempt at recovering a warm start.
pub fn recover(
    source: &dyn WarmStartSource,
    fit_id: &str,
    model_id: &str,
) -> Lookup<ParameterVector, WarmStartUnavailable> {
    source
        .last_sample(fit_id, model_id)
        .map_err(|error| WarmStartUnavailable {
            fit_id: fit_id.to_string(),
            model_id: model_id.to_string(),
            reason: error.to_string(),
        })
        .into()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleCsvSource {
    pub fits_path: PathBuf,
    pub models_path: PathBuf,
}

impl SampleCsvSource {
    #[must_use]
    pub fn from_config(config: &PrepConfig) -> Self {
        SampleCsvSource {
            fits_path: config.fits_path.clone(),
            models_path: config.models_path.clone(),
        }
    }
}

impl WarmStartSource for SampleCsvSource {
    fn last_sample(&self, fit_id: &str, model_id: &str) -> Result<ParameterVector, PrepError> {
        let model_path = self.models_path.join(model_id);
        if !model_path.exists() {
            return Err(format!("model {} not found", model_path.display()).into());
        }
        let fit_path = self.fits_path.join(fit_id);
        debug!("Reading samples from {}", fit_path.display());
        let mut reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .from_path(&fit_path)?;

        let headers = reader.headers()?.clone();
        let columns = ParamName::ALL
            .iter()
            .map(|&name| {
                headers
                    .iter()
                    .position(|header| header.trim() == name.as_str())
                    .map(|index| (name, index))
                    .ok_or_else(|| {
                        PrepError::SchemaMismatch(format!(
                            "{} has no column {name}",
                            fit_path.display()
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut last = None;
        for record in reader.records() {
            last = Some(record?);
        }
        let record = last.ok_or_else(|| {
            PrepError::SchemaMismatch(format!("{} holds no samples", fit_path.display()))
        })?;

        let mut values = BTreeMap::new();
        for (name, index) in columns {
            let value = record
                .get(index)
                .and_then(|field| field.trim().parse::<f64>().ok())
                .ok_or_else(|| {
                    PrepError::SchemaMismatch(format!("{name} is not a number in the last sample"))
                })?;
            values.insert(name, value);
        }
        Ok(ParameterVector::from_values(values))
    }
}
