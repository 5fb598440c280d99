use std::time::Instant;

use tracing::{error, info, info_span};

use mrp_model::{Diagnostic, EnrichedRecord, RunContext, TableRef, ValidatedDataset};

use crate::error::Result;

/// Append-only destination for validated rows.
pub trait TableSink {
    /// Append every row to `table`, returning the number written.
    ///
    /// Implementations must either persist all rows or none of them.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`](crate::LoadError) on any sink failure.
    fn append(&mut self, table: &TableRef, rows: &[EnrichedRecord]) -> Result<u64>;
}

/// Append the validated dataset to the run's destination table.
///
/// Every sink failure collapses to a single `SinkUnavailable` diagnostic; the
/// underlying error is only logged.
pub fn load(
    ctx: &RunContext,
    sink: &mut dyn TableSink,
    dataset: &ValidatedDataset,
) -> Option<Diagnostic> {
    let span = info_span!(parent: &ctx.span, "load", table = %ctx.destination);
    let _guard = span.enter();

    if dataset.is_empty() {
        info!("no rows to load");
        return None;
    }

    info!(row_count = dataset.len(), "starting upload");
    let start = Instant::now();
    match sink.append(&ctx.destination, dataset.rows()) {
        Ok(written) => {
            info!(
                row_count = written,
                duration_ms = start.elapsed().as_millis(),
                "upload complete"
            );
            None
        }
        Err(err) => {
            error!(error = %err, "failed to append rows to destination table");
            Some(Diagnostic::sink_unavailable(ctx))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use mrp_model::{DiagnosticKind, PropertyLookup, RawRecord, Stage};
    use rust_decimal::Decimal;

    use super::*;
    use crate::error::LoadError;

    #[derive(Default)]
    struct MemorySink {
        appended: Vec<(String, usize)>,
    }

    impl TableSink for MemorySink {
        fn append(&mut self, table: &TableRef, rows: &[EnrichedRecord]) -> Result<u64> {
            self.appended.push((table.to_string(), rows.len()));
            Ok(rows.len() as u64)
        }
    }

    struct DownSink;

    impl TableSink for DownSink {
        fn append(&mut self, _table: &TableRef, _rows: &[EnrichedRecord]) -> Result<u64> {
            Err(LoadError::Sink("connection refused".to_string()))
        }
    }

    fn ctx() -> RunContext {
        RunContext::new(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            TableRef::new("ads", "MarketRates"),
        )
    }

    fn dataset(rows: usize) -> ValidatedDataset {
        let raw = (0..rows)
            .map(|unit| RawRecord {
                property_id: 1,
                date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                floorplan: "A1".to_string(),
                building: "1".to_string(),
                unit: unit.to_string(),
                base_rent: Decimal::ONE_HUNDRED,
                market_rent: Decimal::ONE_HUNDRED,
            })
            .collect();
        ValidatedDataset::new(PropertyLookup::default().enrich(raw))
    }

    #[test]
    fn appends_to_destination() {
        let mut sink = MemorySink::default();
        assert_eq!(load(&ctx(), &mut sink, &dataset(3)), None);
        assert_eq!(sink.appended, vec![("ads.MarketRates".to_string(), 3)]);
    }

    #[test]
    fn empty_dataset_skips_sink() {
        let mut sink = MemorySink::default();
        assert_eq!(load(&ctx(), &mut sink, &ValidatedDataset::empty()), None);
        assert!(sink.appended.is_empty());
    }

    #[test]
    fn sink_failure_names_table_and_downtime() {
        let diagnostic = load(&ctx(), &mut DownSink, &dataset(2)).expect("diagnostic");
        assert_eq!(diagnostic.stage, Stage::Load);
        assert_eq!(diagnostic.kind, DiagnosticKind::SinkUnavailable);
        assert!(diagnostic.message.contains("ads.MarketRates"));
        assert!(diagnostic.message.contains("downtime"));
        assert!(!diagnostic.message.contains("connection refused"));
    }
}
