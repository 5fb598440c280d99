use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::Span;

pub const DEFAULT_JOB_NAME: &str = "Market Rate Data Pull";
pub const DEFAULT_CONTACT: &str = "the data engineering team";
pub const DEFAULT_SCHEMA: &str = "ads";
pub const DEFAULT_REMOTE_DIR: &str = "outgoing";
/// Distinct properties present in the feed when the job was first deployed.
pub const DEFAULT_EXPECTED_PROPERTY_COUNT: usize = 111;

/// Destination table, qualified by schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Everything a stage needs to know about the current run.
///
/// Built once by the orchestrator and passed by reference into every stage.
/// The `span` is the run's logging handle; stages create child spans under it.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_date: NaiveDate,
    pub job_name: String,
    pub destination: TableRef,
    pub target_filename: String,
    pub remote_dir: String,
    pub staging_dir: PathBuf,
    /// Human contact named at the end of every diagnostic.
    pub contact: String,
    pub expected_property_count: usize,
    pub span: Span,
}

impl RunContext {
    pub fn new(run_date: NaiveDate, destination: TableRef) -> Self {
        Self {
            run_date,
            job_name: DEFAULT_JOB_NAME.to_string(),
            destination,
            target_filename: String::new(),
            remote_dir: DEFAULT_REMOTE_DIR.to_string(),
            staging_dir: PathBuf::from("temp_dir"),
            contact: DEFAULT_CONTACT.to_string(),
            expected_property_count: DEFAULT_EXPECTED_PROPERTY_COUNT,
            span: Span::none(),
        }
    }

    #[must_use]
    pub fn with_job_name(mut self, job_name: impl Into<String>) -> Self {
        self.job_name = job_name.into();
        self
    }

    #[must_use]
    pub fn with_target_filename(mut self, filename: impl Into<String>) -> Self {
        self.target_filename = filename.into();
        self
    }

    #[must_use]
    pub fn with_remote_dir(mut self, remote_dir: impl Into<String>) -> Self {
        self.remote_dir = remote_dir.into();
        self
    }

    #[must_use]
    pub fn with_staging_dir(mut self, staging_dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = staging_dir.into();
        self
    }

    #[must_use]
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }

    #[must_use]
    pub fn with_expected_property_count(mut self, count: usize) -> Self {
        self.expected_property_count = count;
        self
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Run date as `YYYY-MM-DD`.
    pub fn date_label(&self) -> String {
        self.run_date.format("%Y-%m-%d").to_string()
    }

    /// Where the fetched report lands.
    pub fn staged_file(&self) -> PathBuf {
        self.staging_dir.join(&self.target_filename)
    }
}
