use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use tracing::{debug, trace};

use mrp_model::{REPORT_COLUMNS, RawRecord};

use crate::error::{IngestError, Result};

fn normalize_cell(raw: &str) -> &str {
    raw.trim().trim_matches('\u{feff}')
}

/// Parse a report date written as `YYYYMMDD`.
///
/// Returns `None` unless the value is exactly eight digits forming a real
/// calendar date.
pub fn parse_report_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = value[0..4].parse().ok()?;
    let month = value[4..6].parse().ok()?;
    let day = value[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Read the headerless seven-column report file.
///
/// Blank lines are skipped. The first row that cannot be decoded aborts the
/// read; no partial result is returned.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be opened or any row is invalid.
pub fn read_report(path: &Path) -> Result<Vec<RawRecord>> {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|error| IngestError::csv(path, error))?;
    let records = decode_records(reader, path)?;
    debug!(
        path = %path.display(),
        record_count = records.len(),
        "completed reading report file"
    );
    Ok(records)
}

/// Read report rows from any reader (used for in-memory input).
///
/// # Errors
///
/// Returns [`IngestError`] if any row is invalid.
pub fn read_report_from_reader<R: Read>(input: R) -> Result<Vec<RawRecord>> {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    decode_records(reader, Path::new("<input>"))
}

fn decode_records<R: Read>(mut reader: csv::Reader<R>, path: &Path) -> Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|error| IngestError::csv(path, error))?;
        if row.iter().all(|value| normalize_cell(value).is_empty()) {
            continue;
        }
        let record = decode_row(&row)?;
        trace!(
            property_id = record.property_id,
            date = %record.date,
            unit = %record.unit,
            "decoded report row"
        );
        records.push(record);
    }
    Ok(records)
}

fn decode_row(row: &StringRecord) -> Result<RawRecord> {
    let line = row.position().map_or(0, csv::Position::line);
    if row.len() != REPORT_COLUMNS.len() {
        return Err(IngestError::ColumnCount {
            line,
            expected: REPORT_COLUMNS.len(),
            found: row.len(),
        });
    }
    let cell = |idx: usize| normalize_cell(&row[idx]);
    let invalid = |idx: usize| IngestError::InvalidValue {
        line,
        column: REPORT_COLUMNS[idx],
        value: cell(idx).to_string(),
    };

    let property_id = cell(0).parse::<i64>().map_err(|_| invalid(0))?;
    let date = parse_report_date(cell(1)).ok_or_else(|| invalid(1))?;
    let base_rent = Decimal::from_str(cell(5)).map_err(|_| invalid(5))?;
    let market_rent = Decimal::from_str(cell(6)).map_err(|_| invalid(6))?;

    Ok(RawRecord {
        property_id,
        date,
        floorplan: cell(2).to_string(),
        building: cell(3).to_string(),
        unit: cell(4).to_string(),
        base_rent,
        market_rent,
    })
}
