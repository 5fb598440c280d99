use std::fs;

use chrono::NaiveDate;

use mrp_ingest::{IngestError, load_property_lookup, prepare, read_report};

#[test]
fn reads_report_from_staging_directory() {
    let root = tempfile::tempdir().expect("temp dir");
    let staging = root.path().join("temp_dir");
    prepare(&staging).expect("prepare staging");
    let path = staging.join("unit_rates.csv");
    fs::write(
        &path,
        "101,20240315,A1,1,101,1200.00,1250.00\n102,20240314,B2,2,204,1500,1575\n",
    )
    .expect("write report");

    let records = read_report(&path).expect("read report");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    assert_eq!(records[1].property_id, 102);
}

#[test]
fn missing_report_is_a_csv_error() {
    let root = tempfile::tempdir().expect("temp dir");
    let error = read_report(&root.path().join("absent.csv")).unwrap_err();
    assert!(matches!(error, IngestError::Csv { .. }));
    assert!(error.to_string().contains("absent.csv"));
}

#[test]
fn loads_lookup_with_header() {
    let root = tempfile::tempdir().expect("temp dir");
    let path = root.path().join("properties.csv");
    fs::write(
        &path,
        "PropertyID,Property\n101, Oak Terrace\n102,Maple Court\n",
    )
    .expect("write lookup");

    let lookup = load_property_lookup(&path).expect("load lookup");
    assert_eq!(lookup.len(), 2);
    assert_eq!(lookup.get(101), Some("Oak Terrace"));
    assert_eq!(lookup.get(103), None);
}

#[test]
fn lookup_rejects_non_numeric_ids() {
    let root = tempfile::tempdir().expect("temp dir");
    let path = root.path().join("properties.csv");
    fs::write(&path, "PropertyID,Property\nabc,Oak Terrace\n").expect("write lookup");
    assert!(load_property_lookup(&path).is_err());
}
