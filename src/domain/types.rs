//! Shared table types.
//!
//! Tables are built once per load and never mutated afterwards; analysis
//! code works on copies.

use super::RecordDate;

/// One row of a normalized dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: RecordDate,
    pub value: f64,
    /// Category label used for multi-series breakdowns.
    pub group: Option<String>,
    /// Free-text provenance (e.g. which news report a number came from).
    pub note: Option<String>,
}

impl Record {
    pub fn new(date: impl Into<RecordDate>, value: f64) -> Self {
        Self {
            date: date.into(),
            value,
            group: None,
            note: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Ordered `(date, value, group?, note?)` table.
///
/// Row order is whatever the source produced; nothing here sorts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedSeries {
    records: Vec<Record>,
}

impl NormalizedSeries {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_groups(&self) -> bool {
        self.records.iter().any(|r| r.group.is_some())
    }

    pub fn has_notes(&self) -> bool {
        self.records.iter().any(|r| r.note.is_some())
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl FromIterator<Record> for NormalizedSeries {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a NormalizedSeries {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// A named point on the damage map.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub value: f64,
}

/// Ordered list of map points. Has no date column, so no cutoff applies.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SiteTable {
    sites: Vec<Site>,
}

impl SiteTable {
    pub fn new(sites: Vec<Site>) -> Self {
        Self { sites }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Mean `(lat, lon)`, used to center the map view.
    pub fn midpoint(&self) -> Option<(f64, f64)> {
        if self.sites.is_empty() {
            return None;
        }
        let n = self.sites.len() as f64;
        let lat = self.sites.iter().map(|s| s.lat).sum::<f64>() / n;
        let lon = self.sites.iter().map(|s| s.lon).sum::<f64>() / n;
        Some((lat, lon))
    }
}

impl FromIterator<Site> for SiteTable {
    fn from_iter<I: IntoIterator<Item = Site>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn record_builder_sets_optional_columns() {
        let day = NaiveDate::from_ymd_opt(2023, 7, 16).unwrap();
        let r = Record::new(day, 11.0).with_group("청주 피해 학교").with_note("충북 청주");
        assert_eq!(r.date, RecordDate::Day(day));
        assert_eq!(r.group.as_deref(), Some("청주 피해 학교"));
        assert_eq!(r.note.as_deref(), Some("충북 청주"));
    }

    #[test]
    fn series_reports_optional_columns() {
        let series: NormalizedSeries = vec![
            Record::new(RecordDate::Year(2020), 1.0),
            Record::new(RecordDate::Year(2021), 2.0).with_group("a"),
        ]
        .into_iter()
        .collect();
        assert_eq!(series.len(), 2);
        assert!(series.has_groups());
        assert!(!series.has_notes());
    }

    #[test]
    fn midpoint_averages_coordinates() {
        let table = SiteTable::new(vec![
            Site { name: "a".into(), lat: 36.0, lon: 127.0, value: 1.0 },
            Site { name: "b".into(), lat: 37.0, lon: 128.0, value: 1.0 },
        ]);
        let (lat, lon) = table.midpoint().unwrap();
        assert!((lat - 36.5).abs() < 1e-12);
        assert!((lon - 127.5).abs() < 1e-12);
        assert_eq!(SiteTable::default().midpoint(), None);
    }
}
