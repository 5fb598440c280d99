//! Human-readable failure descriptions.
//!
//! Every stage returns `Option<Diagnostic>`: `None` means the stage succeeded,
//! `Some` ends the run. The rendered message is what recipients receive, so it
//! names the job, the run date, the destination table, the probable cause and
//! a contact without requiring anyone to open the log.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::RunContext;

/// Pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Transfer,
    Validation,
    Load,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Transfer => "transfer",
            Stage::Validation => "validation",
            Stage::Load => "load",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure categories, grouped by stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The transcript carried an explicit error-message marker.
    ExplicitMessage,
    /// Generic system error; the cause is the line after the marker.
    SystemError,
    /// Credentials or host key were rejected.
    AccessDenied,
    /// The remote file is missing.
    NotFound,
    /// No rule matched but the transfer evidently failed.
    Unrecognized,
    /// The transfer client could not be started.
    ClientUnavailable,
    /// The report could not be read or a row could not be decoded.
    MalformedInput,
    /// The feed's distinct property count differs from the configured one.
    UnexpectedPropertyCount { found: usize, expected: usize },
    /// No row is dated on the run date.
    NoDataForDate,
    /// The destination table could not be appended to.
    SinkUnavailable,
}

impl DiagnosticKind {
    pub fn stage(&self) -> Stage {
        match self {
            DiagnosticKind::ExplicitMessage
            | DiagnosticKind::SystemError
            | DiagnosticKind::AccessDenied
            | DiagnosticKind::NotFound
            | DiagnosticKind::Unrecognized
            | DiagnosticKind::ClientUnavailable => Stage::Transfer,
            DiagnosticKind::MalformedInput
            | DiagnosticKind::UnexpectedPropertyCount { .. }
            | DiagnosticKind::NoDataForDate => Stage::Validation,
            DiagnosticKind::SinkUnavailable => Stage::Load,
        }
    }
}

/// A terminal failure for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub kind: DiagnosticKind,
    /// Text quoted from the failing collaborator, when there is one.
    pub cause: Option<String>,
    pub message: String,
}

impl Diagnostic {
    /// Transfer failure quoting `cause` from the client's output.
    pub fn transfer(ctx: &RunContext, kind: DiagnosticKind, cause: impl Into<String>) -> Self {
        let cause = cause.into();
        let detail = match kind {
            DiagnosticKind::AccessDenied => format!(
                "The transfer client responded: {cause} which likely indicates an authentication issue."
            ),
            DiagnosticKind::Unrecognized => format!(
                "The transfer client did not report a known error but the transfer did not complete. Its last output was: {cause}."
            ),
            DiagnosticKind::ClientUnavailable => {
                format!("The transfer client could not be started: {cause}.")
            }
            _ => format!("The transfer client responded: {cause}."),
        };
        let message = format!(
            "{header}\n\nThe transfer script was unable to connect to the FTP or download the {file} file located in the /{dir}/ subdirectory. {detail}\n\n{absent}\n\nPlease reach out to {contact} for assistance as needed.",
            header = header(ctx),
            file = ctx.target_filename,
            dir = ctx.remote_dir,
            absent = absent_data(ctx),
            contact = ctx.contact,
        );
        Self {
            stage: Stage::Transfer,
            kind,
            cause: Some(cause),
            message,
        }
    }

    /// The report file was unreadable or contained an undecodable row.
    pub fn malformed_input(ctx: &RunContext, cause: impl Into<String>) -> Self {
        let cause = cause.into();
        let message = format!(
            "{header}\n\nThe report file {file} could not be processed: {cause}. No rows were loaded. As a result, {absent_lower}\n\nPlease reach out to {contact} for correction.",
            header = header(ctx),
            file = ctx.target_filename,
            absent_lower = lowercase_first(&absent_data(ctx)),
            contact = ctx.contact,
        );
        Self {
            stage: Stage::Validation,
            kind: DiagnosticKind::MalformedInput,
            cause: Some(cause),
            message,
        }
    }

    pub fn unexpected_property_count(ctx: &RunContext, found: usize) -> Self {
        let expected = ctx.expected_property_count;
        let message = format!(
            "{header}\n\nThe report had {found} distinct PropertyIDs while {expected} were expected. This may cause properties to be missing names in the table, and is likely the result of an acquisition or divestiture which has not been incorporated into the configuration. As a result, {absent_lower}\n\nPlease reach out to {contact} for correction.",
            header = header(ctx),
            absent_lower = lowercase_first(&absent_data(ctx)),
            contact = ctx.contact,
        );
        Self {
            stage: Stage::Validation,
            kind: DiagnosticKind::UnexpectedPropertyCount { found, expected },
            cause: None,
            message,
        }
    }

    pub fn no_data_for_date(ctx: &RunContext) -> Self {
        let message = format!(
            "{header}\n\nThe report did not contain data for today, {date}. The scheduled task may need to run later in the day, or the data provider may have failed to publish today's update. {absent}\n\nPlease reach out to {contact} for assistance as needed.",
            header = header(ctx),
            date = ctx.date_label(),
            absent = absent_data(ctx),
            contact = ctx.contact,
        );
        Self {
            stage: Stage::Validation,
            kind: DiagnosticKind::NoDataForDate,
            cause: None,
            message,
        }
    }

    pub fn sink_unavailable(ctx: &RunContext) -> Self {
        let message = format!(
            "{header}\n\nWhile no errors were found in collecting and processing the report data, the program was unable to append today's data into the SQL table {table}. This may be due to database downtime or other factors leading to the table being inaccessible. As a result, {absent_lower}\n\nPlease reach out to {contact} for correction.",
            header = header(ctx),
            table = ctx.destination,
            absent_lower = lowercase_first(&absent_data(ctx)),
            contact = ctx.contact,
        );
        Self {
            stage: Stage::Load,
            kind: DiagnosticKind::SinkUnavailable,
            cause: None,
            message,
        }
    }

    /// Mail subject line for this diagnostic.
    pub fn subject(&self, ctx: &RunContext) -> String {
        format!("{} failed for {}", ctx.job_name, ctx.date_label())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn header(ctx: &RunContext) -> String {
    format!("The {} for {} has failed.", ctx.job_name, ctx.date_label())
}

fn absent_data(ctx: &RunContext) -> String {
    format!(
        "The data for {} will not be present in the {} table.",
        ctx.date_label(),
        ctx.destination
    )
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::context::TableRef;

    fn ctx() -> RunContext {
        RunContext::new(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            TableRef::new("ads", "MarketRates"),
        )
        .with_target_filename("unit_rates.csv")
        .with_contact("the RPA team")
    }

    #[test]
    fn access_denied_mentions_authentication() {
        let diagnostic = Diagnostic::transfer(
            &ctx(),
            DiagnosticKind::AccessDenied,
            "Access denied.",
        );
        assert_eq!(diagnostic.stage, Stage::Transfer);
        assert_eq!(diagnostic.cause.as_deref(), Some("Access denied."));
        assert!(diagnostic.message.contains("authentication issue"));
    }

    #[test]
    fn sink_unavailable_message() {
        let diagnostic = Diagnostic::sink_unavailable(&ctx());
        insta::assert_snapshot!(diagnostic.message, @r"
The Market Rate Data Pull for 2024-03-15 has failed.

While no errors were found in collecting and processing the report data, the program was unable to append today's data into the SQL table ads.MarketRates. This may be due to database downtime or other factors leading to the table being inaccessible. As a result, the data for 2024-03-15 will not be present in the ads.MarketRates table.

Please reach out to the RPA team for correction.
");
    }

    #[test]
    fn property_count_kind_carries_both_counts() {
        let diagnostic = Diagnostic::unexpected_property_count(&ctx(), 112);
        assert_eq!(
            diagnostic.kind,
            DiagnosticKind::UnexpectedPropertyCount {
                found: 112,
                expected: 111
            }
        );
        assert!(diagnostic.message.contains("112 distinct PropertyIDs"));
        assert_eq!(diagnostic.kind.stage(), Stage::Validation);
    }

    #[test]
    fn subject_names_job_and_date() {
        let context = ctx();
        let diagnostic = Diagnostic::no_data_for_date(&context);
        assert_eq!(
            diagnostic.subject(&context),
            "Market Rate Data Pull failed for 2024-03-15"
        );
    }

    #[test]
    fn diagnostic_serializes_with_tagged_kind() {
        let diagnostic = Diagnostic::unexpected_property_count(&ctx(), 110);
        let json = serde_json::to_value(&diagnostic).expect("serialize diagnostic");
        assert_eq!(json["stage"], "validation");
        assert_eq!(json["kind"]["kind"], "unexpected_property_count");
        assert_eq!(json["kind"]["found"], 110);
    }
}
