//! Response normalization.
//!
//! Turns a successful response body into a `NormalizedSeries` or `SiteTable`.
//! Row-level problems (bad date, non-numeric value) drop the row; problems
//! with the body as a whole (not JSON, required field absent, nothing usable)
//! are a `FailureReason::Shape`, which sends the loader to the fallback table.

use std::collections::HashMap;

use chrono::FixedOffset;
use csv::StringRecord;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{NormalizedSeries, Record, RecordDate, Site, SiteTable};
use crate::error::FailureReason;

/// How a series endpoint's body is laid out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SeriesRule {
    /// JSON rows with a named date field and a value field.
    ///
    /// `value_fields` are candidates in priority order; the first one present
    /// in any row becomes the value column.
    JsonFields {
        date_field: String,
        value_fields: Vec<String>,
    },
    /// CSV text.
    ///
    /// Without a `date` header the first column is the date. Without a `value`
    /// header the value is the row sum of every numeric column.
    Csv,
}

impl SeriesRule {
    pub fn json(date_field: &str, value_fields: &[&str]) -> Self {
        SeriesRule::JsonFields {
            date_field: date_field.to_string(),
            value_fields: value_fields.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// How a GeoJSON point endpoint's feature properties are read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeoRule {
    pub value_property: String,
    pub name_property: String,
    /// Name used when a feature has none.
    pub default_name: String,
}

impl Default for GeoRule {
    fn default() -> Self {
        Self {
            value_property: "damage_count".to_string(),
            name_property: "name".to_string(),
            default_name: "학교".to_string(),
        }
    }
}

pub fn parse_series(
    body: &str,
    rule: &SeriesRule,
    offset: FixedOffset,
) -> Result<NormalizedSeries, FailureReason> {
    match rule {
        SeriesRule::JsonFields {
            date_field,
            value_fields,
        } => parse_json_series(body, date_field, value_fields, offset),
        SeriesRule::Csv => parse_csv_series(body, offset),
    }
}

fn parse_json_series(
    body: &str,
    date_field: &str,
    value_fields: &[String],
    offset: FixedOffset,
) -> Result<NormalizedSeries, FailureReason> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| FailureReason::Shape(format!("invalid JSON: {e}")))?;

    let rows: Vec<HashMap<String, Value>> = row_array(&json, date_field)?
        .iter()
        .filter_map(|row| row.as_object().map(flatten_object))
        .collect();

    if !rows.iter().any(|row| row.contains_key(date_field)) {
        return Err(FailureReason::Shape(format!("missing `{date_field}` field")));
    }
    let value_field = value_fields
        .iter()
        .find(|field| rows.iter().any(|row| row.contains_key(field.as_str())))
        .ok_or_else(|| FailureReason::Shape(format!("missing value field (tried {value_fields:?})")))?;

    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;
    for row in &rows {
        let date = row
            .get(date_field)
            .and_then(scalar_text)
            .and_then(|raw| RecordDate::parse(&raw, offset));
        let value = row.get(value_field.as_str()).and_then(scalar_number);
        match (date, value) {
            (Some(date), Some(value)) => records.push(Record::new(date, value)),
            _ => dropped += 1,
        }
    }

    finish_series(records, dropped)
}

/// Rows live either at the top level or under an array-valued member.
///
/// Inside a wrapper object the first array whose rows carry `date_field`
/// wins; otherwise the first array in document order.
fn row_array<'a>(json: &'a Value, date_field: &str) -> Result<&'a Vec<Value>, FailureReason> {
    match json {
        Value::Array(items) => Ok(items),
        Value::Object(map) => {
            let arrays: Vec<&Vec<Value>> = map.values().filter_map(Value::as_array).collect();
            arrays
                .iter()
                .copied()
                .find(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .any(|row| flatten_object(row).contains_key(date_field))
                })
                .or_else(|| arrays.first().copied())
                .ok_or_else(|| FailureReason::Shape("no row array in JSON object".to_string()))
        }
        _ => Err(FailureReason::Shape("JSON body is neither an array nor an object".to_string())),
    }
}

/// Flatten nested objects into `parent.child` keys.
fn flatten_object(map: &Map<String, Value>) -> HashMap<String, Value> {
    fn walk(prefix: &str, map: &Map<String, Value>, out: &mut HashMap<String, Value>) {
        for (key, value) in map {
            let name = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            match value {
                Value::Object(inner) => walk(&name, inner, out),
                other => {
                    out.insert(name, other.clone());
                }
            }
        }
    }

    let mut out = HashMap::new();
    walk("", map, &mut out);
    out
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn scalar_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_csv_series(body: &str, offset: FixedOffset) -> Result<NormalizedSeries, FailureReason> {
    let (records, dropped) = csv_records(body, offset)?;
    finish_series(records, dropped)
}

/// Parse CSV text where an empty table is a valid result (re-imported exports).
///
/// Only an unreadable or column-less header is an error.
pub fn parse_csv_table(body: &str, offset: FixedOffset) -> Result<NormalizedSeries, FailureReason> {
    let (records, dropped) = csv_records(body, offset)?;
    if dropped > 0 {
        debug!(dropped, kept = records.len(), "dropped unparseable rows");
    }
    Ok(NormalizedSeries::new(records))
}

fn csv_records(body: &str, offset: FixedOffset) -> Result<(Vec<Record>, usize), FailureReason> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| FailureReason::Shape(format!("unreadable CSV header: {e}")))?
        .iter()
        .map(normalize_header_name)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(FailureReason::Shape("CSV has no columns".to_string()));
    }

    let position = |name: &str| headers.iter().position(|h| h == name);
    let date_idx = position("date").unwrap_or(0);
    let value_idx = position("value");
    let group_idx = position("group");
    let note_idx = position("note");

    let mut dropped = 0usize;
    let rows: Vec<StringRecord> = reader
        .records()
        .filter_map(|r| match r {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, "skipping unreadable CSV row");
                dropped += 1;
                None
            }
        })
        .collect();

    // Columns summed into `value` when the body has no `value` column.
    let numeric_columns: Vec<usize> = match value_idx {
        Some(_) => Vec::new(),
        None => (0..headers.len())
            .filter(|&idx| idx != date_idx && Some(idx) != group_idx && Some(idx) != note_idx)
            .filter(|&idx| is_numeric_column(&rows, idx))
            .collect(),
    };

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(date) = row.get(date_idx).and_then(|raw| RecordDate::parse(raw, offset)) else {
            dropped += 1;
            continue;
        };

        let value = match value_idx {
            Some(idx) => row.get(idx).and_then(parse_number),
            None => Some(
                numeric_columns
                    .iter()
                    .filter_map(|&idx| row.get(idx).and_then(parse_number))
                    .sum::<f64>(),
            ),
        };
        let Some(value) = value else {
            dropped += 1;
            continue;
        };

        let mut record = Record::new(date, value);
        record.group = optional_cell(row, group_idx);
        record.note = optional_cell(row, note_idx);
        records.push(record);
    }

    Ok((records, dropped))
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

/// A column is numeric when every non-empty cell parses as a number.
fn is_numeric_column(rows: &[StringRecord], idx: usize) -> bool {
    rows.iter()
        .filter_map(|row| row.get(idx))
        .filter(|cell| !cell.trim().is_empty())
        .all(|cell| parse_number(cell).is_some())
}

fn optional_cell(row: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| row.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn finish_series(records: Vec<Record>, dropped: usize) -> Result<NormalizedSeries, FailureReason> {
    if dropped > 0 {
        debug!(dropped, kept = records.len(), "dropped unparseable rows");
    }
    if records.is_empty() {
        return Err(FailureReason::Shape("no parseable rows".to_string()));
    }
    Ok(NormalizedSeries::new(records))
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Option<Value>,
}

impl Feature {
    /// `(lon, lat)` of a point geometry.
    fn point(&self) -> Option<(f64, f64)> {
        let coords = self.geometry.as_ref()?.coordinates.as_ref()?.as_array()?;
        Some((scalar_number(coords.first()?)?, scalar_number(coords.get(1)?)?))
    }

    fn property(&self, name: &str) -> Option<&Value> {
        self.properties.as_ref()?.get(name)
    }
}

pub fn parse_sites(body: &str, rule: &GeoRule) -> Result<SiteTable, FailureReason> {
    let collection: FeatureCollection = serde_json::from_str(body)
        .map_err(|e| FailureReason::Shape(format!("invalid GeoJSON: {e}")))?;

    let sites: Vec<Site> = collection
        .features
        .iter()
        .filter_map(|feature| {
            let (lon, lat) = feature.point()?;
            let value = feature
                .property(&rule.value_property)
                .and_then(scalar_number)
                .unwrap_or(1.0);
            let name = feature
                .property(&rule.name_property)
                .and_then(Value::as_str)
                .unwrap_or(rule.default_name.as_str())
                .to_string();
            Some(Site { name, lat, lon, value })
        })
        .collect();

    if sites.is_empty() {
        return Err(FailureReason::Shape("no features with coordinates".to_string()));
    }
    Ok(SiteTable::new(sites))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::data::cutoff::reference_offset;

    fn day(y: i32, m: u32, d: u32) -> RecordDate {
        RecordDate::Day(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn precip_rule() -> SeriesRule {
        SeriesRule::json("date", &["precip", "value"])
    }

    #[test]
    fn json_rows_are_renamed_and_bad_rows_dropped() {
        let body = r#"[
            {"date": "2024-01-01", "precip": 41.5},
            {"date": "garbage", "precip": 10},
            {"date": "2024-02-01", "precip": "38.25"},
            {"date": "2024-03-01", "precip": null}
        ]"#;
        let series = parse_series(body, &precip_rule(), reference_offset()).unwrap();
        let rows: Vec<_> = series.iter().map(|r| (r.date, r.value)).collect();
        assert_eq!(rows, vec![(day(2024, 1, 1), 41.5), (day(2024, 2, 1), 38.25)]);
    }

    #[test]
    fn json_rows_under_wrapper_object() {
        let body = r#"{"meta": {"count": 1}, "data": [{"date": 2019, "value": 3}]}"#;
        let series = parse_series(body, &precip_rule(), reference_offset()).unwrap();
        assert_eq!(series.records()[0].date, RecordDate::Year(2019));
        assert_eq!(series.records()[0].value, 3.0);
    }

    #[test]
    fn wrapper_object_prefers_array_with_date_field() {
        let body = r#"{"rows": [{"date": "2024-01-01", "precip": 5}], "links": []}"#;
        let series = parse_series(body, &precip_rule(), reference_offset()).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.records()[0].value, 5.0);

        let body = r#"{"alerts": [{"level": 2}], "series": [{"date": "2024-02-01", "value": 9}]}"#;
        let series = parse_series(body, &precip_rule(), reference_offset()).unwrap();
        assert_eq!(series.records()[0].date, day(2024, 2, 1));
    }

    #[test]
    fn nested_fields_are_flattened() {
        let body = r#"[{"obs": {"date": "2024-05-01", "precip": 7}}]"#;
        let rule = SeriesRule::json("obs.date", &["obs.precip"]);
        let series = parse_series(body, &rule, reference_offset()).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn missing_date_field_is_shape_failure() {
        let body = r#"[{"day": "2024-01-01", "precip": 1.0}]"#;
        let err = parse_series(body, &precip_rule(), reference_offset()).unwrap_err();
        assert!(matches!(err, FailureReason::Shape(ref m) if m.contains("date")));
    }

    #[test]
    fn missing_value_field_is_shape_failure() {
        let body = r#"[{"date": "2024-01-01", "rain": 1.0}]"#;
        let err = parse_series(body, &precip_rule(), reference_offset()).unwrap_err();
        assert!(matches!(err, FailureReason::Shape(_)));
    }

    #[test]
    fn non_json_body_is_shape_failure() {
        let err = parse_series("<html>oops</html>", &precip_rule(), reference_offset()).unwrap_err();
        assert!(matches!(err, FailureReason::Shape(_)));
    }

    #[test]
    fn csv_with_value_column() {
        let body = "date,value,group\n2023-07-16,24,휴업\n2023-08-10,5,\nbad,1,x\n";
        let series = parse_series(body, &SeriesRule::Csv, reference_offset()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.records()[0].group.as_deref(), Some("휴업"));
        assert_eq!(series.records()[1].group, None);
    }

    #[test]
    fn csv_first_column_becomes_date_and_numeric_columns_are_summed() {
        let body = "day,closures,remote,region\n2023-07-16,10,14,충북\n2024-07-20,30,,전국\n";
        let series = parse_series(body, &SeriesRule::Csv, reference_offset()).unwrap();
        let rows: Vec<_> = series.iter().map(|r| (r.date, r.value)).collect();
        assert_eq!(rows, vec![(day(2023, 7, 16), 24.0), (day(2024, 7, 20), 30.0)]);
    }

    #[test]
    fn csv_without_numeric_columns_yields_zero_values() {
        let body = "date,source\n2023-07-16,news\n";
        let series = parse_series(body, &SeriesRule::Csv, reference_offset()).unwrap();
        assert_eq!(series.records()[0].value, 0.0);
    }

    #[test]
    fn csv_header_bom_is_ignored() {
        let body = "\u{feff}date,value\n2023-07-16,24\n";
        let series = parse_series(body, &SeriesRule::Csv, reference_offset()).unwrap();
        assert_eq!(series.records()[0].value, 24.0);
    }

    #[test]
    fn csv_with_no_usable_rows_is_shape_failure() {
        let body = "date,value\nnope,1\n";
        assert!(parse_series(body, &SeriesRule::Csv, reference_offset()).is_err());
    }

    #[test]
    fn csv_table_allows_header_only_body() {
        let series = parse_csv_table("date,value\n", reference_offset()).unwrap();
        assert!(series.is_empty());
        assert!(parse_csv_table("", reference_offset()).is_err());
    }

    #[test]
    fn geojson_points_with_defaults() {
        let body = r#"{"type": "FeatureCollection", "features": [
            {"geometry": {"coordinates": [127.489, 36.642]}, "properties": {"name": "청주", "damage_count": 11}},
            {"geometry": {"coordinates": [127.327, 36.873]}, "properties": {}},
            {"geometry": {}, "properties": {"name": "no coords"}}
        ]}"#;
        let table = parse_sites(body, &GeoRule::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.sites()[0].name, "청주");
        assert_eq!(table.sites()[0].value, 11.0);
        assert_eq!(table.sites()[1].name, "학교");
        assert_eq!(table.sites()[1].value, 1.0);
        assert!((table.sites()[1].lat - 36.873).abs() < 1e-9);
    }

    #[test]
    fn geojson_without_features_is_shape_failure() {
        let err = parse_sites(r#"{"type": "FeatureCollection"}"#, &GeoRule::default()).unwrap_err();
        assert!(matches!(err, FailureReason::Shape(_)));
    }
}
