//! Loading of a region's daily case table.
//!
//! The table carries one row per day with the columns `dates2` (`MM/DD/YY`), `new_cases`,
//! `new_recover`, `new_deaths` and, optionally, `population`. Rows are expected in
//! chronological order without gaps; this is assumed, not checked.
use std::io;
use std::path::Path;

use chrono::NaiveDate;
use log::{debug, trace};
use serde::Deserialize;

use crate::error::PrepError;

/// Date format shared by every input table and date argument.
pub const DATE_FORMAT: &str = "%m/%d/%y";

/// Number of observed channels: new cases, new recoveries, new deaths.
pub const N_OSTATES: usize = 3;

/// Parses a `MM/DD/YY` date.
///
/// # Errors
///
/// Returns `PrepError::InvalidDateFormat` carrying the offending text.
pub fn parse_date(value: &str) -> Result<NaiveDate, PrepError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| PrepError::InvalidDateFormat(value.to_string()))
}

#[derive(Deserialize)]
struct DailyRecord {
    dates2: String,
    new_cases: f64,
    new_recover: f64,
    new_deaths: f64,
    #[serde(default)]
    population: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub new_cases: i64,
    /// May be negative when upstream data was corrected.
    pub new_recover: i64,
    pub new_deaths: i64,
    pub population: Option<f64>,
}

impl DailyRow {
    /// The observed channels in the order the inference engine expects them.
    #[must_use]
    pub fn counts(&self) -> [i64; N_OSTATES] {
        [self.new_cases, self.new_recover, self.new_deaths]
    }
}

impl TryFrom<DailyRecord> for DailyRow {
    type Error = PrepError;

    #[allow(clippy::cast_possible_truncation)]
    fn try_from(record: DailyRecord) -> Result<Self, Self::Error> {
        Ok(DailyRow {
            date: parse_date(&record.dates2)?,
            new_cases: record.new_cases as i64,
            new_recover: record.new_recover as i64,
            new_deaths: record.new_deaths as i64,
            population: record.population.filter(|p| !p.is_nan()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    rows: Vec<DailyRow>,
}

impl DailySeries {
    #[must_use]
    pub fn new(rows: Vec<DailyRow>) -> Self {
        DailySeries { rows }
    }

    /// Reads a daily series from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns a `PrepError` if the file cannot be read, a required column is missing or a
    /// row's date is not `MM/DD/YY`.
    pub fn from_path(path: &Path) -> Result<Self, PrepError> {
        debug!("Loading daily series from {}", path.display());
        let reader = csv::Reader::from_path(path)?;
        Self::from_csv(reader)
    }

    /// Reads a daily series from any CSV source with a header row.
    ///
    /// # Errors
    ///
    /// See [`DailySeries::from_path`].
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, PrepError> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, PrepError> {
        let mut rows = Vec::new();
        for result in reader.deserialize() {
            let record: DailyRecord = result?;
            rows.push(DailyRow::try_from(record)?);
        }
        trace!("Read {} daily rows", rows.len());
        Ok(DailySeries { rows })
    }

    #[must_use]
    pub fn rows(&self) -> &[DailyRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|row| row.date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.iter().map(|row| row.date)
    }

    /// Keeps only the rows dated on or before `cutoff`.
    #[must_use]
    pub fn retain_through(mut self, cutoff: NaiveDate) -> Self {
        self.rows.retain(|row| row.date <= cutoff);
        self
    }

    /// Index of the first day with at least `threshold` new cases.
    #[must_use]
    pub fn onset_index(&self, threshold: i64) -> Option<usize> {
        self.rows.iter().position(|row| row.new_cases >= threshold)
    }
}
