//! Known mitigation start dates per region.
//!
//! The table is a CSV with the columns `region` and `date` (`MM/DD/YY`). A table that cannot
//! be read is not an error: it is kept as an unavailable table and every lookup against it
//! falls back.
use std::fmt::{self, Display};
use std::path::Path;

use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;

use crate::error::PrepError;
use crate::lookup::Lookup;
use crate::series::parse_date;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MitigationRecord {
    pub region: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq)]
enum TableState {
    Loaded(Vec<MitigationRecord>),
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MitigationTable {
    state: TableState,
}

/// Why no mitigation index could be found.
#[derive(Debug, Clone, PartialEq)]
pub enum MitigationFallback {
    TableUnavailable(String),
    RegionAbsent(String),
    UnparseableDate { region: String, date: String },
    DateNotInSeries { region: String, date: NaiveDate },
}

impl Display for MitigationFallback {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Could not use mitigation prior data (")?;
        match self {
            MitigationFallback::TableUnavailable(reason) => {
                write!(f, "table unavailable: {reason}")?;
            }
            MitigationFallback::RegionAbsent(region) => {
                write!(f, "no entry for {region}")?;
            }
            MitigationFallback::UnparseableDate { region, date } => {
                write!(f, "date {date:?} for {region} is not MM/DD/YY")?;
            }
            MitigationFallback::DateNotInSeries { region, date } => {
                write!(f, "date {date} for {region} is not in the series")?;
            }
        }
        write!(f, "); setting mitigation prior to default.")
    }
}

impl MitigationTable {
    /// Loads the table at `path`. Read failures are recorded, not returned.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(records) => {
                debug!(
                    "Loaded {} mitigation entries from {}",
                    records.len(),
                    path.display()
                );
                Self::from_records(records)
            }
            Err(error) => {
                debug!("Mitigation table {} unavailable: {error}", path.display());
                Self::unavailable(format!("{}: {error}", path.display()))
            }
        }
    }

    fn read(path: &Path) -> Result<Vec<MitigationRecord>, PrepError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        for result in reader.deserialize() {
            records.push(result?);
        }
        Ok(records)
    }

    #[must_use]
    pub fn from_records(records: Vec<MitigationRecord>) -> Self {
        MitigationTable {
            state: TableState::Loaded(records),
        }
    }

    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        MitigationTable {
            state: TableState::Unavailable(reason.into()),
        }
    }

    /// Finds the index on `axis` of the mitigation start for `region`.
    ///
    /// The date must appear on `axis` exactly; on a weekly axis a date falling inside a week
    /// rather than on its first day is not found. Only the first row for `region` is consulted.
    pub fn lookup(&self, region: &str, axis: &[NaiveDate]) -> Lookup<usize, MitigationFallback> {
        let records = match &self.state {
            TableState::Loaded(records) => records,
            TableState::Unavailable(reason) => {
                return Lookup::Fallback(MitigationFallback::TableUnavailable(reason.clone()));
            }
        };
        let Some(record) = records.iter().find(|record| record.region == region) else {
            return Lookup::Fallback(MitigationFallback::RegionAbsent(region.to_string()));
        };
        let Ok(date) = parse_date(&record.date) else {
            return Lookup::Fallback(MitigationFallback::UnparseableDate {
                region: region.to_string(),
                date: record.date.clone(),
            });
        };
        axis.iter()
            .position(|day| *day == date)
            .map_or_else(
                || {
                    Lookup::Fallback(MitigationFallback::DateNotInSeries {
                        region: region.to_string(),
                        date,
                    })
                },
                Lookup::Found,
            )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::series::test::date;
    use chrono::Days;
    use std::io::Write;
    use tempfile::tempdir;

    fn table() -> MitigationTable {
        MitigationTable::from_records(vec![
            MitigationRecord {
                region: "US_MD".to_string(),
                date: "03/16/20".to_string(),
            },
            MitigationRecord {
                region: "US_MD".to_string(),
                date: "03/30/20".to_string(),
            },
            MitigationRecord {
                region: "Italy".to_string(),
                date: "3-9-2020".to_string(),
            },
        ])
    }

    fn daily_axis(start: NaiveDate, len: u64) -> Vec<NaiveDate> {
        (0..len).map(|i| start + Days::new(i)).collect()
    }

    #[test]
    fn exact_match_on_daily_axis_uses_first_row() {
        let axis = daily_axis(date(3, 1, 2020), 30);
        assert_eq!(table().lookup("US_MD", &axis), Lookup::Found(15));
    }

    fn weekly_axis(start: NaiveDate) -> Vec<NaiveDate> {
        (0..4).map(|w| start + Days::new(7 * w)).collect()
    }

    #[test]
    fn weekly_axis_matches_week_start() {
        // Weeks start on Mondays; 03/16/20 is the third.
        let axis = weekly_axis(date(3, 2, 2020));
        assert_eq!(table().lookup("US_MD", &axis), Lookup::Found(2));
    }

    #[test]
    fn weekly_axis_does_not_match_inside_week() {
        // Weeks start on Sundays; 03/16/20 is the second day of the week of 03/15/20.
        let axis = weekly_axis(date(3, 1, 2020));
        assert_eq!(
            table().lookup("US_MD", &axis),
            Lookup::Fallback(MitigationFallback::DateNotInSeries {
                region: "US_MD".to_string(),
                date: date(3, 16, 2020),
            })
        );
    }

    #[test]
    fn absent_region_falls_back() {
        let axis = daily_axis(date(3, 1, 2020), 30);
        assert_eq!(
            table().lookup("US_VA", &axis),
            Lookup::Fallback(MitigationFallback::RegionAbsent("US_VA".to_string()))
        );
    }

    #[test]
    fn malformed_date_falls_back() {
        let axis = daily_axis(date(3, 1, 2020), 30);
        assert!(matches!(
            table().lookup("Italy", &axis),
            Lookup::Fallback(MitigationFallback::UnparseableDate { .. })
        ));
    }

    #[test]
    fn date_outside_series_falls_back() {
        let axis = daily_axis(date(4, 1, 2020), 30);
        assert_eq!(
            table().lookup("US_MD", &axis),
            Lookup::Fallback(MitigationFallback::DateNotInSeries {
                region: "US_MD".to_string(),
                date: date(3, 16, 2020),
            })
        );
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempdir().unwrap();
        let table = MitigationTable::load(&dir.path().join("mitigationprior.csv"));
        let lookup = table.lookup("US_MD", &[date(3, 16, 2020)]);
        assert!(matches!(
            lookup,
            Lookup::Fallback(MitigationFallback::TableUnavailable(_))
        ));
    }

    #[test]
    fn loads_from_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mitigationprior.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "region,date\nUS_NY,03/22/20").unwrap();
        let table = MitigationTable::load(&path);
        let axis = daily_axis(date(3, 20, 2020), 5);
        assert_eq!(table.lookup("US_NY", &axis), Lookup::Found(2));
    }

    #[test]
    fn fallback_message_is_a_notice() {
        let reason = MitigationFallback::RegionAbsent("US_VA".to_string());
        assert_eq!(
            reason.to_string(),
            "Could not use mitigation prior data (no entry for US_VA); \
             setting mitigation prior to default."
        );
    }
}
