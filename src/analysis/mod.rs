//! Filtering and aggregation over normalized tables.
//!
//! Every function takes a table by reference and returns a new one; loaded
//! tables are never modified in place.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;

use crate::domain::{NormalizedSeries, Record, RecordDate, Site, SiteTable};

/// Aggregation bucket for time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Period {
    Day,
    Month,
    Year,
}

impl Period {
    /// First day of the bucket containing `date`.
    pub fn start_of(self, date: &RecordDate) -> NaiveDate {
        let day = date.day();
        match self {
            Period::Day => day,
            Period::Month => day.with_day(1).unwrap_or(day),
            Period::Year => day.with_ordinal(1).unwrap_or(day),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Day => "일별",
            Period::Month => "월별",
            Period::Year => "연별",
        }
    }
}

/// Per-group sum.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub group: String,
    pub value: f64,
}

/// Keep records whose calendar day is within `[from, to]` and whose group is
/// in `groups`. Open bounds and an empty `groups` list do not filter.
pub fn filter_series(
    series: &NormalizedSeries,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    groups: &[String],
) -> NormalizedSeries {
    series
        .iter()
        .filter(|r| {
            let day = r.date.day();
            from.is_none_or(|f| day >= f) && to.is_none_or(|t| day <= t)
        })
        .filter(|r| {
            groups.is_empty() || r.group.as_ref().is_some_and(|g| groups.iter().any(|want| want == g))
        })
        .cloned()
        .collect()
}

/// Sum values per period bucket, ascending by bucket start.
pub fn aggregate(series: &NormalizedSeries, period: Period) -> NormalizedSeries {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in series {
        *buckets.entry(period.start_of(&r.date)).or_insert(0.0) += r.value;
    }
    buckets
        .into_iter()
        .map(|(start, value)| Record::new(start, value))
        .collect()
}

/// Sum values per distinct date, ascending.
pub fn sum_by_date(series: &NormalizedSeries) -> NormalizedSeries {
    let mut totals: BTreeMap<RecordDate, f64> = BTreeMap::new();
    for r in series {
        *totals.entry(r.date).or_insert(0.0) += r.value;
    }
    totals
        .into_iter()
        .map(|(date, value)| Record::new(date, value))
        .collect()
}

/// Stable sort by date.
pub fn sort_by_date(series: &NormalizedSeries) -> NormalizedSeries {
    let mut records = series.records().to_vec();
    records.sort_by(|a, b| a.date.cmp(&b.date));
    NormalizedSeries::new(records)
}

/// Per-group sums, largest first (ties by name). Ungrouped records are skipped.
pub fn totals_by_group(series: &NormalizedSeries) -> Vec<GroupTotal> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for r in series {
        if let Some(group) = r.group.as_deref() {
            *totals.entry(group).or_insert(0.0) += r.value;
        }
    }
    let mut out: Vec<GroupTotal> = totals
        .into_iter()
        .map(|(group, value)| GroupTotal {
            group: group.to_string(),
            value,
        })
        .collect();
    out.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.group.cmp(&b.group)));
    out
}

/// Trailing mean over up to `window` values (partial windows at the start).
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        let n = (i + 1).min(window);
        out.push(sum / n as f64);
    }
    out
}

/// Sort by date and replace values with their trailing mean.
pub fn smooth(series: &NormalizedSeries, window: usize) -> NormalizedSeries {
    let sorted = sort_by_date(series);
    let values: Vec<f64> = sorted.iter().map(|r| r.value).collect();
    sorted
        .into_records()
        .into_iter()
        .zip(rolling_mean(&values, window))
        .map(|(mut r, mean)| {
            r.value = mean;
            r
        })
        .collect()
}

/// Earliest and latest calendar day.
pub fn date_bounds(series: &NormalizedSeries) -> Option<(NaiveDate, NaiveDate)> {
    let min = series.iter().map(|r| r.date.day()).min()?;
    let max = series.iter().map(|r| r.date.day()).max()?;
    Some((min, max))
}

pub fn distinct_groups(series: &NormalizedSeries) -> Vec<String> {
    series
        .iter()
        .filter_map(|r| r.group.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// One map point per record whose group has known coordinates.
pub fn region_sites(series: &NormalizedSeries, coords: &[(&str, f64, f64)]) -> SiteTable {
    series
        .iter()
        .filter_map(|r| {
            let group = r.group.as_deref()?;
            let (_, lat, lon) = coords.iter().find(|(name, _, _)| *name == group)?;
            Some(Site {
                name: group.to_string(),
                lat: *lat,
                lon: *lon,
                value: r.value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data::catalog::{REGION_COORDINATES, user_reports_table};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn actions() -> NormalizedSeries {
        NormalizedSeries::new(vec![
            Record::new(day(2023, 7, 16), 24.0),
            Record::new(day(2023, 7, 30), 6.0),
            Record::new(day(2023, 8, 10), 5.0),
            Record::new(day(2024, 7, 20), 40.0),
        ])
    }

    #[test]
    fn aggregate_by_month_and_year() {
        let monthly = aggregate(&actions(), Period::Month);
        let rows: Vec<_> = monthly.iter().map(|r| (r.date, r.value)).collect();
        assert_eq!(
            rows,
            vec![
                (RecordDate::Day(day(2023, 7, 1)), 30.0),
                (RecordDate::Day(day(2023, 8, 1)), 5.0),
                (RecordDate::Day(day(2024, 7, 1)), 40.0),
            ]
        );

        let yearly = aggregate(&actions(), Period::Year);
        let values: Vec<f64> = yearly.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![35.0, 40.0]);
    }

    #[test]
    fn aggregate_sorts_unsorted_input() {
        let series = NormalizedSeries::new(vec![
            Record::new(day(2025, 3, 19), 12.0),
            Record::new(day(2023, 7, 16), 24.0),
        ]);
        let daily = aggregate(&series, Period::Day);
        assert_eq!(daily.records()[0].date, RecordDate::Day(day(2023, 7, 16)));
    }

    #[test]
    fn rolling_mean_uses_partial_windows() {
        let out = rolling_mean(&[2.0, 4.0, 6.0, 8.0], 3);
        assert_eq!(out, vec![2.0, 3.0, 4.0, 6.0]);
        assert_eq!(rolling_mean(&[5.0, 7.0], 0), vec![5.0, 7.0]);
        assert!(rolling_mean(&[], 3).is_empty());
    }

    #[test]
    fn smooth_sorts_before_averaging() {
        let series = NormalizedSeries::new(vec![
            Record::new(RecordDate::Year(2016), 4.0),
            Record::new(RecordDate::Year(2015), 2.0),
        ]);
        let smoothed = smooth(&series, 2);
        let rows: Vec<_> = smoothed.iter().map(|r| (r.date, r.value)).collect();
        assert_eq!(rows, vec![(RecordDate::Year(2015), 2.0), (RecordDate::Year(2016), 3.0)]);
    }

    #[test]
    fn filter_by_range_and_groups() {
        let reports = user_reports_table();

        let july_2023 = filter_series(&reports, Some(day(2023, 7, 1)), Some(day(2023, 7, 31)), &[]);
        assert_eq!(july_2023.len(), 8);

        let only_cheongju = filter_series(&reports, None, None, &["청주 피해 학교".to_string()]);
        assert_eq!(only_cheongju.len(), 1);
        assert_eq!(only_cheongju.records()[0].value, 11.0);
    }

    #[test]
    fn group_totals_are_sorted_descending() {
        let totals = totals_by_group(&user_reports_table());
        assert_eq!(totals[0].group, "학사일정 조정");
        assert_eq!(totals[0].value, 247.0);
        assert_eq!(totals[1].group, "휴업/원격/조치");
        assert_eq!(totals[1].value, 41.0);
        // 제천 and 보은 tie at 1; name order breaks the tie.
        let tail: Vec<&str> = totals[totals.len() - 2..].iter().map(|t| t.group.as_str()).collect();
        assert_eq!(tail, vec!["보은 피해 학교", "제천 피해 학교"]);
    }

    #[test]
    fn sum_by_date_merges_same_day_rows() {
        let totals = sum_by_date(&user_reports_table());
        let first = &totals.records()[0];
        assert_eq!(first.date, RecordDate::Day(day(2023, 7, 16)));
        assert_eq!(first.value, 24.0 + 11.0 + 3.0 + 2.0 + 2.0 + 2.0 + 1.0 + 1.0);
    }

    #[test]
    fn bounds_and_groups() {
        let reports = user_reports_table();
        assert_eq!(date_bounds(&reports), Some((day(2023, 7, 16), day(2025, 7, 18))));
        assert_eq!(date_bounds(&NormalizedSeries::default()), None);
        assert_eq!(distinct_groups(&reports).len(), 9);
    }

    #[test]
    fn region_sites_only_for_known_regions() {
        let sites = region_sites(&user_reports_table(), &REGION_COORDINATES);
        assert_eq!(sites.len(), 7);
        assert_eq!(sites.sites()[0].name, "청주 피해 학교");
        assert_eq!(sites.sites()[0].value, 11.0);
    }
}
