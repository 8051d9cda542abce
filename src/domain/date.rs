//! Date-or-year values.
//!
//! Remote sources and hardcoded tables mix bare years (`2015`), calendar
//! days (`2023-07-16`) and full timestamps. `RecordDate` keeps whichever
//! precision the input had while still giving a single total order.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

const DAY_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
const MOMENT_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordDate {
    /// A bare year; orders as January 1st of that year.
    Year(i32),
    Day(NaiveDate),
    /// A wall-clock timestamp in the reference offset.
    Moment(NaiveDateTime),
}

impl RecordDate {
    /// Parse a loosely formatted date cell.
    ///
    /// Timestamps carrying their own offset (RFC 3339) are converted into
    /// `offset` so every `Moment` shares the same wall clock.
    pub fn parse(raw: &str, offset: FixedOffset) -> Option<Self> {
        let s = raw.trim().trim_start_matches('\u{feff}');
        if s.is_empty() {
            return None;
        }

        if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
            let year: i32 = s.parse().ok()?;
            return (year >= 1).then_some(RecordDate::Year(year));
        }

        if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
            return NaiveDate::parse_from_str(s, "%Y%m%d").ok().map(RecordDate::Day);
        }

        for fmt in DAY_FORMATS {
            if let Ok(day) = NaiveDate::parse_from_str(s, fmt) {
                return Some(RecordDate::Day(day));
            }
        }

        // Year-month ("2024-07") means the first of the month.
        if s.len() == 7 {
            if let Ok(day) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
                return Some(RecordDate::Day(day));
            }
        }

        for fmt in MOMENT_FORMATS {
            if let Ok(moment) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(RecordDate::Moment(moment));
            }
        }

        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| RecordDate::Moment(dt.with_timezone(&offset).naive_local()))
    }

    /// Calendar day the value starts on.
    pub fn day(&self) -> NaiveDate {
        match self {
            RecordDate::Year(year) => NaiveDate::from_ymd_opt(*year, 1, 1).unwrap_or(NaiveDate::MIN),
            RecordDate::Day(day) => *day,
            RecordDate::Moment(moment) => moment.date(),
        }
    }

    /// Earliest instant the value denotes.
    pub fn start(&self) -> NaiveDateTime {
        match self {
            RecordDate::Moment(moment) => *moment,
            other => other.day().and_time(NaiveTime::MIN),
        }
    }

    fn precision_rank(&self) -> u8 {
        match self {
            RecordDate::Year(_) => 0,
            RecordDate::Day(_) => 1,
            RecordDate::Moment(_) => 2,
        }
    }
}

impl Ord for RecordDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start()
            .cmp(&other.start())
            .then_with(|| self.precision_rank().cmp(&other.precision_rank()))
    }
}

impl PartialOrd for RecordDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<NaiveDate> for RecordDate {
    fn from(day: NaiveDate) -> Self {
        RecordDate::Day(day)
    }
}

impl fmt::Display for RecordDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordDate::Year(year) => write!(f, "{year:04}"),
            RecordDate::Day(day) => write!(f, "{}", day.format("%Y-%m-%d")),
            RecordDate::Moment(moment) => write!(f, "{}", moment.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_shapes() {
        assert_eq!(RecordDate::parse("2015", kst()), Some(RecordDate::Year(2015)));
        assert_eq!(RecordDate::parse(" 2023-07-16 ", kst()), Some(RecordDate::Day(day(2023, 7, 16))));
        assert_eq!(RecordDate::parse("2023/08/10", kst()), Some(RecordDate::Day(day(2023, 8, 10))));
        assert_eq!(RecordDate::parse("20240720", kst()), Some(RecordDate::Day(day(2024, 7, 20))));
        assert_eq!(RecordDate::parse("2024-07", kst()), Some(RecordDate::Day(day(2024, 7, 1))));
        assert_eq!(
            RecordDate::parse("2024-07-20 13:30:00", kst()),
            Some(RecordDate::Moment(day(2024, 7, 20).and_hms_opt(13, 30, 0).unwrap()))
        );
    }

    #[test]
    fn rfc3339_is_shifted_into_reference_offset() {
        let parsed = RecordDate::parse("2024-07-19T16:00:00Z", kst()).unwrap();
        assert_eq!(parsed, RecordDate::Moment(day(2024, 7, 20).and_hms_opt(1, 0, 0).unwrap()));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(RecordDate::parse("", kst()), None);
        assert_eq!(RecordDate::parse("not a date", kst()), None);
        assert_eq!(RecordDate::parse("2024-13-01", kst()), None);
    }

    #[test]
    fn ordering_mixes_precisions() {
        let mut dates = vec![
            RecordDate::Day(day(2015, 3, 1)),
            RecordDate::Year(2016),
            RecordDate::Year(2015),
            RecordDate::Moment(day(2014, 12, 31).and_hms_opt(23, 0, 0).unwrap()),
        ];
        dates.sort();
        assert_eq!(
            dates,
            vec![
                RecordDate::Moment(day(2014, 12, 31).and_hms_opt(23, 0, 0).unwrap()),
                RecordDate::Year(2015),
                RecordDate::Day(day(2015, 3, 1)),
                RecordDate::Year(2016),
            ]
        );
    }

    #[test]
    fn display_reparses_to_same_value() {
        for raw in ["2015", "2023-07-16", "2024-07-20 13:30:00"] {
            let parsed = RecordDate::parse(raw, kst()).unwrap();
            assert_eq!(parsed.to_string(), raw);
        }
    }
}
