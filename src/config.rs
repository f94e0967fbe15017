//! Run-time configuration shared read-only by every preparation step.
//!
//! A `PrepConfig` is built once (usually with [`PrepConfig::from_json_path`]) and passed by
//! reference into each component. Every field has a default, so a configuration file only
//! needs the values that differ:
//!
//! ```json
//! {
//!     "mode": "weekly",
//!     "fixed_t": true,
//!     "data_path": "data",
//!     "seed": 42
//! }
//! ```
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PrepError;
use crate::params::PriorConfig;
use crate::series::parse_date;

/// Name of the per-region mitigation table inside `data_path`.
pub const MITIGATION_FILE: &str = "mitigationprior.csv";

/// Whether observations are handed over per day or as weekly totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepMode {
    #[default]
    Daily,
    Weekly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Number of projected periods appended to the time axis.
    pub horizon: usize,
    /// Shared reference date for `fixed_t`, as `MM/DD/YY`.
    pub epoch: String,
    /// Minimum daily new cases marking the onset day.
    pub onset_threshold: i64,
    /// Periods after onset assumed for mitigation when no known date applies.
    pub mitigation_fallback: i64,
    /// Re-anchor `tm` and `ts` onto the epoch axis.
    pub fixed_t: bool,
    pub mode: PrepMode,
    /// Directory holding [`MITIGATION_FILE`].
    pub data_path: PathBuf,
    /// Directory holding sample tables of previous fits.
    pub fits_path: PathBuf,
    /// Directory holding compiled models.
    pub models_path: PathBuf,
    /// Seed for fresh parameter draws; drawn from OS entropy when absent.
    pub seed: Option<u64>,
    pub priors: PriorConfig,
}

impl Default for PrepConfig {
    fn default() -> Self {
        PrepConfig {
            horizon: 120,
            epoch: "01/22/20".to_string(),
            onset_threshold: 5,
            mitigation_fallback: 10,
            fixed_t: false,
            mode: PrepMode::Daily,
            data_path: PathBuf::from("data"),
            fits_path: PathBuf::from("fits"),
            models_path: PathBuf::from("models"),
            seed: None,
            priors: PriorConfig::default(),
        }
    }
}

impl PrepConfig {
    /// Reads a configuration from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a `PrepError` if the file cannot be read, is not valid JSON, or carries an
    /// epoch that is not `MM/DD/YY`.
    pub fn from_json_path(path: &Path) -> Result<Self, PrepError> {
        let data = fs::read_to_string(path)?;
        let config: PrepConfig = serde_json::from_str(&data)?;
        config.epoch_date()?;
        Ok(config)
    }

    /// The configured epoch as a calendar date.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::InvalidDateFormat` if `epoch` is malformed.
    pub fn epoch_date(&self) -> Result<NaiveDate, PrepError> {
        parse_date(&self.epoch)
    }

    #[must_use]
    pub fn mitigation_table_path(&self) -> PathBuf {
        self.data_path.join(MITIGATION_FILE)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::{ParamName, Prior};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults() {
        let config = PrepConfig::default();
        assert_eq!(config.horizon, 120);
        assert_eq!(
            config.epoch_date().unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 22).unwrap()
        );
        assert_eq!(config.mode, PrepMode::Daily);
        assert_eq!(
            config.mitigation_table_path(),
            PathBuf::from("data/mitigationprior.csv")
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"mode": "weekly", "fixed_t": true, "seed": 7,
                "priors": {{"q": {{"dist": "exponential", "scale": 0.2}}}}}}"#
        )
        .unwrap();
        let config = PrepConfig::from_json_path(file.path()).unwrap();
        assert_eq!(config.mode, PrepMode::Weekly);
        assert!(config.fixed_t);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.horizon, 120);
        assert_eq!(
            config.priors.get(ParamName::Q),
            Prior::Exponential { scale: 0.2 }
        );
    }

    #[test]
    fn malformed_epoch_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"epoch": "2020-01-22"}}"#).unwrap();
        let error = PrepConfig::from_json_path(file.path()).unwrap_err();
        assert!(matches!(error, PrepError::InvalidDateFormat(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let error = PrepConfig::from_json_path(Path::new("/no/such/config.json")).unwrap_err();
        assert!(matches!(error, PrepError::IoError(_)));
    }
}
