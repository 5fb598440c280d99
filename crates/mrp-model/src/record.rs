use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Column order of the headerless report file.
pub const REPORT_COLUMNS: [&str; 7] = [
    "PropertyID",
    "Date",
    "Floorplan",
    "Building",
    "Unit",
    "BaseRent",
    "MarketRent",
];

/// One decoded line of the report file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub property_id: i64,
    pub date: NaiveDate,
    pub floorplan: String,
    pub building: String,
    pub unit: String,
    pub base_rent: Decimal,
    pub market_rent: Decimal,
}

/// A raw record with its property display name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedRecord {
    /// `None` when the lookup has no entry for the property id.
    pub property: Option<String>,
    pub record: RawRecord,
}

impl EnrichedRecord {
    pub fn property_id(&self) -> i64 {
        self.record.property_id
    }

    pub fn date(&self) -> NaiveDate {
        self.record.date
    }
}

/// PropertyID to display-name table, immutable for the run.
#[derive(Debug, Clone, Default)]
pub struct PropertyLookup {
    names: BTreeMap<i64, String>,
}

impl PropertyLookup {
    pub fn new(names: BTreeMap<i64, String>) -> Self {
        Self { names }
    }

    pub fn get(&self, property_id: i64) -> Option<&str> {
        self.names.get(&property_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Attach display names to every record, preserving file order.
    pub fn enrich(&self, records: Vec<RawRecord>) -> Vec<EnrichedRecord> {
        records
            .into_iter()
            .map(|record| EnrichedRecord {
                property: self.get(record.property_id).map(str::to_string),
                record,
            })
            .collect()
    }
}

impl FromIterator<(i64, String)> for PropertyLookup {
    fn from_iter<I: IntoIterator<Item = (i64, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Number of distinct property ids across a record set.
pub fn distinct_property_count(records: &[EnrichedRecord]) -> usize {
    records
        .iter()
        .map(EnrichedRecord::property_id)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Rows eligible for persistence: count-checked and dated on the run date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedDataset {
    rows: Vec<EnrichedRecord>,
}

impl ValidatedDataset {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(rows: Vec<EnrichedRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[EnrichedRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<EnrichedRecord> {
        self.rows
    }
}
