use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::debug;

use mrp_model::PropertyLookup;

use crate::error::{IngestError, Result};

#[derive(Debug, Deserialize)]
struct LookupRow {
    #[serde(rename = "PropertyID")]
    property_id: i64,
    #[serde(rename = "Property")]
    property: String,
}

/// Load the PropertyID to display-name table from a CSV with a
/// `PropertyID,Property` header.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] if the file cannot be read or a row does not
/// deserialize.
pub fn load_property_lookup(path: &Path) -> Result<PropertyLookup> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|error| IngestError::csv(path, error))?;
    let mut rows = Vec::new();
    for row in reader.deserialize::<LookupRow>() {
        let row = row.map_err(|error| IngestError::csv(path, error))?;
        rows.push((row.property_id, row.property));
    }
    let lookup: PropertyLookup = rows.into_iter().collect();
    debug!(
        path = %path.display(),
        property_count = lookup.len(),
        "loaded property lookup"
    );
    Ok(lookup)
}
