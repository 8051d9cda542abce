//! CSV artifacts.
//!
//! Series export as `date,value[,group][,note]`, one row per record; the
//! optional columns appear only when some record carries them. Sites export
//! as `name,lat,lon,value`. A UTF-8 BOM is written by default so spreadsheet
//! tools pick the right encoding for Korean labels.

use std::fs;
use std::path::Path;

use chrono::FixedOffset;

use crate::data::normalize::parse_csv_table;
use crate::domain::{NormalizedSeries, SiteTable};
use crate::error::AppError;

const BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub bom: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { bom: true }
    }
}

/// Render a series to CSV bytes.
pub fn series_csv_bytes(series: &NormalizedSeries, options: ExportOptions) -> Result<Vec<u8>, AppError> {
    let with_group = series.has_groups();
    let with_note = series.has_notes();

    let mut writer = csv::Writer::from_writer(prefix(options));

    let mut header = vec!["date", "value"];
    if with_group {
        header.push("group");
    }
    if with_note {
        header.push("note");
    }
    writer
        .write_record(&header)
        .map_err(|e| AppError::io(format!("Failed to write CSV header: {e}")))?;

    for r in series {
        let mut row = vec![r.date.to_string(), r.value.to_string()];
        if with_group {
            row.push(r.group.clone().unwrap_or_default());
        }
        if with_note {
            row.push(r.note.clone().unwrap_or_default());
        }
        writer
            .write_record(&row)
            .map_err(|e| AppError::io(format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::io(format!("Failed to flush CSV: {e}")))
}

/// Render sites to CSV bytes.
pub fn sites_csv_bytes(table: &SiteTable, options: ExportOptions) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(prefix(options));
    writer
        .write_record(["name", "lat", "lon", "value"])
        .map_err(|e| AppError::io(format!("Failed to write CSV header: {e}")))?;
    for site in table.sites() {
        writer
            .write_record([
                site.name.clone(),
                site.lat.to_string(),
                site.lon.to_string(),
                site.value.to_string(),
            ])
            .map_err(|e| AppError::io(format!("Failed to write CSV row: {e}")))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::io(format!("Failed to flush CSV: {e}")))
}

pub fn write_series_csv(path: &Path, series: &NormalizedSeries, options: ExportOptions) -> Result<(), AppError> {
    let bytes = series_csv_bytes(series, options)?;
    write_file(path, &bytes)
}

pub fn write_sites_csv(path: &Path, table: &SiteTable, options: ExportOptions) -> Result<(), AppError> {
    let bytes = sites_csv_bytes(table, options)?;
    write_file(path, &bytes)
}

/// Read back a series CSV written by `write_series_csv` (BOM optional).
pub fn read_series_csv(path: &Path, offset: FixedOffset) -> Result<NormalizedSeries, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read CSV '{}': {e}", path.display())))?;
    parse_csv_table(text.trim_start_matches('\u{feff}'), offset)
        .map_err(|e| AppError::new(3, format!("Invalid series CSV '{}': {e}", path.display())))
}

fn prefix(options: ExportOptions) -> Vec<u8> {
    if options.bom { BOM.to_vec() } else { Vec::new() }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    fs::write(path, bytes).map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))
}
