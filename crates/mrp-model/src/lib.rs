pub mod context;
pub mod diagnostic;
pub mod record;

pub use context::{
    DEFAULT_CONTACT, DEFAULT_EXPECTED_PROPERTY_COUNT, DEFAULT_JOB_NAME, DEFAULT_REMOTE_DIR,
    DEFAULT_SCHEMA, RunContext, TableRef,
};
pub use diagnostic::{Diagnostic, DiagnosticKind, Stage};
pub use record::{
    EnrichedRecord, PropertyLookup, REPORT_COLUMNS, RawRecord, ValidatedDataset,
    distinct_property_count,
};
