//! Weekly totals anchored to the onset weekday.
//!
//! Starting at the onset day, the daily rows are cut into consecutive seven-day buckets, so
//! every bucket starts on the same weekday as the onset day. A trailing bucket with fewer
//! than seven days is dropped, and negative weekly totals (left behind by upstream data
//! corrections) are clipped to zero.
use std::fmt::{self, Display};

use chrono::{Datelike, NaiveDate, Weekday};
use log::{info, trace};

use crate::alignment::resolve_tm;
use crate::config::PrepConfig;
use crate::error::PrepError;
use crate::lookup::Lookup;
use crate::mitigation::MitigationTable;
use crate::series::{DailyRow, DailySeries, N_OSTATES};
use crate::stan_data::{time_axis, weekly_offset, Prepared, StanData};

pub const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeeklyBucket {
    /// First day of the bucket.
    pub start: NaiveDate,
    pub totals: [i64; N_OSTATES],
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySeries {
    pub anchor: Weekday,
    pub buckets: Vec<WeeklyBucket>,
}

impl WeeklySeries {
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.buckets.iter().map(|bucket| bucket.start).collect()
    }
}

/// No population figure was found for the region.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationUnavailable(pub String);

impl Display for PopulationUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Could not get population estimate for {}", self.0)
    }
}

/// Sums `rows` into weekly buckets starting at the first row.
///
/// Bucket membership is `floor(days since first row / 7)`; contiguous rows with the same
/// bucket number form one bucket.
#[must_use]
pub fn aggregate(rows: &[DailyRow]) -> Option<WeeklySeries> {
    let anchor_date = rows.first()?.date;
    // (bucket number, member count, bucket)
    let mut groups: Vec<(i64, usize, WeeklyBucket)> = Vec::new();

    for row in rows {
        let index = (row.date - anchor_date).num_days().div_euclid(7);
        match groups.last_mut() {
            Some((current, members, bucket)) if *current == index => {
                for (total, count) in bucket.totals.iter_mut().zip(row.counts()) {
                    *total += count;
                }
                *members += 1;
            }
            _ => groups.push((
                index,
                1,
                WeeklyBucket {
                    start: row.date,
                    totals: row.counts(),
                },
            )),
        }
    }

    if groups
        .last()
        .is_some_and(|(_, members, _)| *members < DAYS_PER_WEEK)
    {
        if let Some((_, _, bucket)) = groups.pop() {
            trace!("Dropping partial week starting {}", bucket.start);
        }
    }

    let buckets = groups
        .into_iter()
        .map(|(_, _, mut bucket)| {
            for total in &mut bucket.totals {
                *total = (*total).max(0);
            }
            bucket
        })
        .collect();

    Some(WeeklySeries {
        anchor: anchor_date.weekday(),
        buckets,
    })
}

/// First known population among `rows`.
pub fn first_population(rows: &[DailyRow], region: &str) -> Lookup<f64, PopulationUnavailable> {
    rows.iter()
        .find_map(|row| row.population)
        .ok_or_else(|| PopulationUnavailable(region.to_string()))
        .into()
}

/// Builds the weekly bundle for `series`.
///
/// `t0` is the daily onset index; as in the daily bundle it also marks where the observed
/// window starts, here counted in weekly rows. When there are fewer weeks than `t0` the
/// observed window is empty and `ts` covers only the horizon after `t0`.
///
/// The mitigation date must fall on a week's first day to be matched.
///
/// # Errors
///
/// Returns `PrepError::InvalidDateFormat` if `fixed_t` is set and the configured epoch is
/// malformed.
pub fn prepare_weekly(
    series: &DailySeries,
    region: &str,
    mitigation: &MitigationTable,
    config: &PrepConfig,
) -> Result<Prepared, PrepError> {
    let Some(t0) = series.onset_index(config.onset_threshold) else {
        info!("{region}: no day reaches {} new cases", config.onset_threshold);
        return Ok(Prepared::NoUsableData);
    };
    let retained = &series.rows()[t0..];
    let onset_date = retained[0].date;
    let Some(weekly) = aggregate(retained) else {
        return Ok(Prepared::NoUsableData);
    };
    trace!(
        "{region}: {} complete weeks anchored on {}",
        weekly.len(),
        weekly.anchor
    );

    let tm = resolve_tm(mitigation.lookup(region, &weekly.dates()), t0, config);
    let population = first_population(retained, region)
        .map(Some)
        .or_fallback(|_| None);

    let weeks = weekly.len();
    let n_obs = weeks.saturating_sub(t0);
    let mut stan_data = StanData {
        n_ostates: N_OSTATES,
        tm,
        ts: time_axis(t0, t0 + n_obs, config.horizon),
        y: weekly
            .buckets
            .iter()
            .skip(t0)
            .map(|bucket| bucket.totals)
            .collect(),
        n_obs,
        n_weeks: n_obs,
        n_total: n_obs + config.horizon,
        population,
    };
    if config.fixed_t {
        stan_data.apply_offset(weekly_offset(onset_date, config.epoch_date()?));
    }
    Ok(Prepared::Ready {
        stan_data,
        onset_date,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mitigation::{MitigationFallback, MitigationRecord};
    use crate::series::test::{date, series_from_cases};

    fn ready(prepared: Prepared) -> (StanData, NaiveDate) {
        match prepared {
            Prepared::Ready {
                stan_data,
                onset_date,
            } => (stan_data, onset_date),
            Prepared::NoUsableData => panic!("expected data"),
        }
    }

    #[test]
    fn two_complete_weeks_from_wednesday() {
        // 01/22/20 is a Wednesday.
        let series = series_from_cases(date(1, 22, 2020), &[1; 14]);
        let weekly = aggregate(series.rows()).unwrap();
        assert_eq!(weekly.anchor, Weekday::Wed);
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly.buckets[0].totals, [7, 0, 0]);
        assert_eq!(weekly.buckets[1].totals, [7, 0, 0]);
        assert_eq!(weekly.dates(), vec![date(1, 22, 2020), date(1, 29, 2020)]);
    }

    #[test]
    fn partial_trailing_week_is_dropped() {
        let series = series_from_cases(date(1, 22, 2020), &[1; 15]);
        let weekly = aggregate(series.rows()).unwrap();
        assert_eq!(weekly.len(), 2);
        assert!(weekly.buckets.iter().all(|bucket| bucket.totals[0] == 7));
    }

    #[test]
    fn negative_weekly_totals_are_clipped() {
        let mut rows = series_from_cases(date(3, 2, 2020), &[5; 14]).rows().to_vec();
        for row in &mut rows[..7] {
            row.new_recover = -2;
        }
        rows[8].new_deaths = -1;
        rows[9].new_deaths = 3;
        let weekly = aggregate(&rows).unwrap();
        assert_eq!(weekly.buckets[0].totals, [35, 0, 0]);
        assert_eq!(weekly.buckets[1].totals, [35, 0, 2]);
        assert!(weekly
            .buckets
            .iter()
            .flat_map(|bucket| bucket.totals)
            .all(|total| total >= 0));
    }

    #[test]
    fn empty_rows_have_no_weeks() {
        assert_eq!(aggregate(&[]), None);
    }

    #[test]
    fn no_usable_data_below_threshold() {
        let series = series_from_cases(date(3, 1, 2020), &[1; 30]);
        let prepared = prepare_weekly(
            &series,
            "US_MD",
            &MitigationTable::unavailable("none"),
            &PrepConfig::default(),
        )
        .unwrap();
        assert_eq!(prepared, Prepared::NoUsableData);
    }

    #[test]
    fn weekly_bundle_reuses_daily_onset_index() {
        // Onset on day 2; 28 retained days form four weeks.
        let mut cases = vec![0, 0];
        cases.extend([6; 28]);
        let series = series_from_cases(date(3, 1, 2020), &cases);
        let (stan_data, onset_date) = ready(
            prepare_weekly(
                &series,
                "US_MD",
                &MitigationTable::unavailable("none"),
                &PrepConfig::default(),
            )
            .unwrap(),
        );
        assert_eq!(onset_date, date(3, 3, 2020));
        assert_eq!(stan_data.tm, 12);
        assert_eq!(stan_data.n_obs, 2);
        assert_eq!(stan_data.n_weeks, 2);
        assert_eq!(stan_data.n_total, 122);
        assert_eq!(stan_data.y, vec![[42, 0, 0], [42, 0, 0]]);
        assert_eq!(stan_data.ts.len(), stan_data.n_total);
        assert_eq!(stan_data.ts[0], 2);
    }

    fn mitigation_on(day: &str) -> MitigationTable {
        MitigationTable::from_records(vec![MitigationRecord {
            region: "US_MD".to_string(),
            date: day.to_string(),
        }])
    }

    #[test]
    fn mitigation_on_week_start_is_matched() {
        // Weeks start 01/22, 01/29, 02/05 and 02/12.
        let series = series_from_cases(date(1, 22, 2020), &[5; 28]);
        let table = mitigation_on("02/05/20");
        let (stan_data, _) =
            ready(prepare_weekly(&series, "US_MD", &table, &PrepConfig::default()).unwrap());
        assert_eq!(stan_data.tm, 2);
    }

    #[test]
    fn mitigation_inside_week_falls_back() {
        // 02/07/20 is the third day of the week starting 02/05/20.
        let series = series_from_cases(date(1, 22, 2020), &[5; 28]);
        let table = mitigation_on("02/07/20");
        let dates = aggregate(series.rows()).unwrap().dates();
        assert!(matches!(
            table.lookup("US_MD", &dates),
            Lookup::Fallback(MitigationFallback::DateNotInSeries { .. })
        ));
        let (stan_data, _) =
            ready(prepare_weekly(&series, "US_MD", &table, &PrepConfig::default()).unwrap());
        assert_eq!(stan_data.tm, 10);
    }

    #[test]
    fn population_is_first_known_value() {
        let mut rows = series_from_cases(date(1, 22, 2020), &[5; 14]).rows().to_vec();
        rows[3].population = Some(6_045_680.0);
        rows[5].population = Some(1.0);
        let series = DailySeries::new(rows);
        let (stan_data, _) = ready(
            prepare_weekly(
                &series,
                "US_MD",
                &MitigationTable::unavailable("none"),
                &PrepConfig::default(),
            )
            .unwrap(),
        );
        assert_eq!(stan_data.population, Some(6_045_680.0));
    }

    #[test]
    fn missing_population_is_a_fallback() {
        let series = series_from_cases(date(1, 22, 2020), &[5; 14]);
        let lookup = first_population(series.rows(), "US_MD");
        assert_eq!(
            lookup,
            Lookup::Fallback(PopulationUnavailable("US_MD".to_string()))
        );
        assert_eq!(
            lookup.reason().unwrap().to_string(),
            "Could not get population estimate for US_MD"
        );
    }

    #[test]
    fn fixed_t_uses_week_granularity() {
        let series = series_from_cases(date(2, 5, 2020), &[5; 21]);
        let config = PrepConfig {
            fixed_t: true,
            ..PrepConfig::default()
        };
        let (stan_data, _) = ready(
            prepare_weekly(&series, "US_MD", &MitigationTable::unavailable("none"), &config)
                .unwrap(),
        );
        // 14 days after the epoch.
        assert_eq!(stan_data.tm, 12);
        assert_eq!(stan_data.ts[0], 2);
    }

    #[test]
    fn fixed_t_applies_without_a_complete_week() {
        // 03/01/20 is 39 days after the epoch, in week 5.
        let series = series_from_cases(date(3, 1, 2020), &[5; 5]);
        let config = PrepConfig {
            fixed_t: true,
            ..PrepConfig::default()
        };
        let (stan_data, onset_date) = ready(
            prepare_weekly(&series, "US_MD", &MitigationTable::unavailable("none"), &config)
                .unwrap(),
        );
        assert_eq!(onset_date, date(3, 1, 2020));
        assert_eq!(stan_data.n_obs, 0);
        assert!(stan_data.y.is_empty());
        assert_eq!(stan_data.tm, 15);
        assert_eq!(stan_data.ts[0], 5);
        assert_eq!(stan_data.ts.len(), stan_data.n_total);
    }

    #[test]
    fn time_axis_matches_total_when_onset_exceeds_weeks() {
        // Onset on day 8 leaves a single week, fewer than t0.
        let mut cases = vec![0; 8];
        cases.extend([5; 7]);
        let series = series_from_cases(date(3, 1, 2020), &cases);
        let (stan_data, _) = ready(
            prepare_weekly(
                &series,
                "US_MD",
                &MitigationTable::unavailable("none"),
                &PrepConfig::default(),
            )
            .unwrap(),
        );
        assert_eq!(stan_data.n_obs, 0);
        assert_eq!(stan_data.n_total, 120);
        assert_eq!(stan_data.ts.len(), stan_data.n_total);
        assert_eq!(stan_data.ts[0], 8);
        assert_eq!(stan_data.tm, 18);
    }
}
