use chrono::NaiveDate;
use rust_decimal::Decimal;

use mrp_load::{DEFAULT_BATCH_SIZE, PostgresSink, load};
use mrp_model::{DiagnosticKind, PropertyLookup, RawRecord, RunContext, TableRef, ValidatedDataset};

fn dataset() -> ValidatedDataset {
    let lookup: PropertyLookup = [(7, "Oak Terrace".to_string())].into_iter().collect();
    ValidatedDataset::new(lookup.enrich(vec![RawRecord {
        property_id: 7,
        date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        floorplan: "A1".to_string(),
        building: "1".to_string(),
        unit: "101".to_string(),
        base_rent: Decimal::new(145000, 2),
        market_rent: Decimal::new(150000, 2),
    }]))
}

#[test]
fn batch_size_defaults_and_never_reaches_zero() {
    let sink = PostgresSink::new("host=localhost");
    assert_eq!(sink.batch_size(), DEFAULT_BATCH_SIZE);
    assert_eq!(sink.with_batch_size(0).batch_size(), 1);
}

#[test]
fn unreachable_database_is_sink_unavailable() {
    let ctx = RunContext::new(
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        TableRef::new("ads", "MarketRates"),
    );
    let mut sink = PostgresSink::new("host=127.0.0.1 port=1 user=postgres connect_timeout=2");
    let diagnostic = load(&ctx, &mut sink, &dataset()).expect("diagnostic");
    assert_eq!(diagnostic.kind, DiagnosticKind::SinkUnavailable);
    assert!(diagnostic.message.contains("ads.MarketRates"));
}
