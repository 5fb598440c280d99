use chrono::NaiveDate;

use mrp_model::{EnrichedRecord, distinct_property_count};

/// Compare the distinct PropertyID count with the expected value.
///
/// Returns the found count when it differs.
pub fn check_property_count(records: &[EnrichedRecord], expected: usize) -> Result<(), usize> {
    let found = distinct_property_count(records);
    if found == expected {
        Ok(())
    } else {
        Err(found)
    }
}

/// Keep the records dated on `run_date`, in file order.
pub fn filter_run_date(records: Vec<EnrichedRecord>, run_date: NaiveDate) -> Vec<EnrichedRecord> {
    records
        .into_iter()
        .filter(|record| record.date() == run_date)
        .collect()
}
