//! "No future data" filter.
//!
//! The boundary is midnight of the current day in a fixed reference offset
//! (UTC+9 by default), never the host's local timezone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};

use crate::domain::{NormalizedSeries, RecordDate};

/// Reference offset for cutoff comparisons, in seconds east of UTC.
pub const REFERENCE_OFFSET_SECS: i32 = 9 * 3600;

pub fn reference_offset() -> FixedOffset {
    FixedOffset::east_opt(REFERENCE_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// First excluded calendar day; records must start strictly before its midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff {
    day: NaiveDate,
}

impl Cutoff {
    /// Cutoff for "today" as seen from `offset` at instant `now`.
    pub fn at(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            day: now.with_timezone(&offset).date_naive(),
        }
    }

    pub fn from_day(day: NaiveDate) -> Self {
        Self { day }
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn boundary(&self) -> NaiveDateTime {
        self.day.and_time(NaiveTime::MIN)
    }

    pub fn admits(&self, date: &RecordDate) -> bool {
        date.start() < self.boundary()
    }

    /// Drop every record at or after the boundary, keeping row order.
    pub fn apply(&self, series: NormalizedSeries) -> NormalizedSeries {
        series
            .into_records()
            .into_iter()
            .filter(|r| self.admits(&r.date))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::domain::Record;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cutoff_uses_reference_offset_not_utc() {
        // 2025-07-17 16:30 UTC is already 2025-07-18 01:30 in UTC+9.
        let now = Utc.with_ymd_and_hms(2025, 7, 17, 16, 30, 0).unwrap();
        let cutoff = Cutoff::at(now, reference_offset());
        assert_eq!(cutoff.day(), day(2025, 7, 18));

        let utc_cutoff = Cutoff::at(now, Utc.fix());
        assert_eq!(utc_cutoff.day(), day(2025, 7, 17));
    }

    #[test]
    fn boundary_day_is_excluded() {
        let cutoff = Cutoff::from_day(day(2025, 7, 18));
        assert!(cutoff.admits(&RecordDate::Day(day(2025, 7, 17))));
        assert!(!cutoff.admits(&RecordDate::Day(day(2025, 7, 18))));
        assert!(!cutoff.admits(&RecordDate::Moment(day(2025, 7, 18).and_hms_opt(0, 0, 1).unwrap())));
        assert!(cutoff.admits(&RecordDate::Moment(day(2025, 7, 17).and_hms_opt(23, 59, 59).unwrap())));
    }

    #[test]
    fn years_count_from_january_first() {
        let cutoff = Cutoff::from_day(day(2025, 1, 1));
        assert!(cutoff.admits(&RecordDate::Year(2024)));
        assert!(!cutoff.admits(&RecordDate::Year(2025)));
    }

    #[test]
    fn apply_keeps_order() {
        let series = NormalizedSeries::new(vec![
            Record::new(day(2024, 7, 20), 40.0),
            Record::new(day(2030, 1, 1), 1.0),
            Record::new(day(2023, 7, 16), 24.0),
        ]);
        let out = Cutoff::from_day(day(2025, 1, 1)).apply(series);
        let values: Vec<f64> = out.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![40.0, 24.0]);
    }
}
