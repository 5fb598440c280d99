use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, info_span, warn};

use mrp_ingest::read_report;
use mrp_model::{Diagnostic, PropertyLookup, RawRecord, RunContext, ValidatedDataset};

use crate::checks::{check_property_count, filter_run_date};

/// Validate the staged report at `path`.
///
/// The returned dataset is non-empty only when the diagnostic is `None`.
pub fn validate(
    ctx: &RunContext,
    path: &Path,
    lookup: &PropertyLookup,
) -> (ValidatedDataset, Option<Diagnostic>) {
    let span = info_span!(parent: &ctx.span, "validate", path = %path.display());
    let _guard = span.enter();

    let records = match read_report(path) {
        Ok(records) => records,
        Err(error) => {
            warn!(error = %error, "report file could not be decoded");
            return (
                ValidatedDataset::empty(),
                Some(Diagnostic::malformed_input(ctx, error.to_string())),
            );
        }
    };
    validate_records(ctx, records, lookup)
}

/// Validate already-decoded records.
pub fn validate_records(
    ctx: &RunContext,
    records: Vec<RawRecord>,
    lookup: &PropertyLookup,
) -> (ValidatedDataset, Option<Diagnostic>) {
    let start = Instant::now();
    let record_count = records.len();
    debug!(
        record_count,
        lookup_size = lookup.len(),
        "enriching records with property names"
    );
    let enriched = lookup.enrich(records);
    let unnamed = enriched.iter().filter(|r| r.property.is_none()).count();
    if unnamed > 0 {
        debug!(unnamed, "records without a property name");
    }

    // Polices the whole feed, so it runs before the date filter.
    if let Err(found) = check_property_count(&enriched, ctx.expected_property_count) {
        warn!(
            found,
            expected = ctx.expected_property_count,
            "unexpected distinct property count, discarding dataset"
        );
        return (
            ValidatedDataset::empty(),
            Some(Diagnostic::unexpected_property_count(ctx, found)),
        );
    }

    let today = filter_run_date(enriched, ctx.run_date);
    if today.is_empty() {
        warn!(run_date = %ctx.run_date, record_count, "report has no rows for run date");
        return (
            ValidatedDataset::empty(),
            Some(Diagnostic::no_data_for_date(ctx)),
        );
    }

    info!(
        record_count,
        retained = today.len(),
        duration_ms = start.elapsed().as_millis(),
        "validation complete"
    );
    (ValidatedDataset::new(today), None)
}
