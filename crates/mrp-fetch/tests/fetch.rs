use std::cell::RefCell;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use proptest::prelude::*;

use mrp_fetch::{
    FetchError, FetchOptions, TransferClient, TransferOutput, TransferScript,
    UnrecognizedOutputPolicy, fetch,
};
use mrp_model::{DiagnosticKind, RunContext, Stage, TableRef};

struct FakeClient {
    lines: Vec<String>,
    exit_success: bool,
    /// Written into the staging area to simulate a completed download.
    deliver: Option<String>,
    scripts: RefCell<Vec<TransferScript>>,
}

impl FakeClient {
    fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|line| (*line).to_string()).collect(),
            exit_success: true,
            deliver: None,
            scripts: RefCell::new(Vec::new()),
        }
    }
}

impl TransferClient for FakeClient {
    fn run(&self, script: &TransferScript) -> Result<TransferOutput, FetchError> {
        self.scripts.borrow_mut().push(script.clone());
        if let Some(path) = &self.deliver {
            fs::write(path, "1,20240315,A1,1,101,900,950\n").unwrap();
        }
        Ok(TransferOutput {
            lines: self.lines.clone(),
            exit_success: self.exit_success,
        })
    }
}

struct BrokenClient;

impl TransferClient for BrokenClient {
    fn run(&self, _script: &TransferScript) -> Result<TransferOutput, FetchError> {
        Err(FetchError::Spawn {
            program: "winscp.com".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
        })
    }
}

fn ctx(staging: &Path) -> RunContext {
    RunContext::new(
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        TableRef::new("ads", "MarketRates"),
    )
    .with_target_filename("unit_rates.csv")
    .with_staging_dir(staging)
}

fn options() -> FetchOptions {
    FetchOptions::new("sftp://reports@example.com/", "ssh-ed25519 255 abc")
}

#[test]
fn system_error_scenario_quotes_next_line() {
    let dir = tempfile::tempdir().unwrap();
    let client = FakeClient::new(&[
        "pwd",
        "cd outgoing",
        "System Error.",
        "Connection timed out",
        "exit",
    ]);
    let diagnostic = fetch(&ctx(dir.path()), &client, &options()).expect("diagnostic");
    assert_eq!(diagnostic.stage, Stage::Transfer);
    assert_eq!(diagnostic.kind, DiagnosticKind::SystemError);
    assert_eq!(diagnostic.cause.as_deref(), Some("Connection timed out"));
    assert!(diagnostic.message.contains("2024-03-15"));
    assert!(diagnostic.message.contains("ads.MarketRates"));
}

#[test]
fn missing_remote_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let client = FakeClient::new(&[
        "Session started.",
        "Can't get attributes of file 'unit_rates.csv'.",
        "No such file or directory.",
        "File or folder 'unit_rates.csv' does not exist.",
    ]);
    let diagnostic = fetch(&ctx(dir.path()), &client, &options()).expect("diagnostic");
    assert_eq!(diagnostic.kind, DiagnosticKind::NotFound);
}

#[test]
fn clean_transcript_succeeds_and_sends_script() {
    let dir = tempfile::tempdir().unwrap();
    let context = ctx(dir.path());
    let mut client = FakeClient::new(&["Session started.", "/outgoing", "unit_rates.csv | 100%"]);
    client.deliver = Some(context.staged_file().display().to_string());

    assert_eq!(fetch(&context, &client, &options()), None);
    let scripts = client.scripts.borrow();
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts[0].commands[2], "cd outgoing");
    assert!(scripts[0].commands[3].starts_with("get unit_rates.csv "));
}

#[test]
fn unrecognized_failure_passes_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = FakeClient::new(&["Network error: Software caused connection abort"]);
    client.exit_success = false;
    assert_eq!(fetch(&ctx(dir.path()), &client, &options()), None);
}

#[test]
fn unrecognized_failure_can_fail_closed() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = FakeClient::new(&["Network error: Software caused connection abort", ""]);
    client.exit_success = false;
    let options = options().with_unrecognized_output(UnrecognizedOutputPolicy::TreatAsFailure);
    let diagnostic = fetch(&ctx(dir.path()), &client, &options).expect("diagnostic");
    assert_eq!(diagnostic.kind, DiagnosticKind::Unrecognized);
    assert_eq!(
        diagnostic.cause.as_deref(),
        Some("Network error: Software caused connection abort")
    );
}

#[test]
fn fail_closed_accepts_delivered_file() {
    let dir = tempfile::tempdir().unwrap();
    let context = ctx(dir.path());
    let mut client = FakeClient::new(&["Session started."]);
    client.deliver = Some(context.staged_file().display().to_string());
    let options = options().with_unrecognized_output(UnrecognizedOutputPolicy::TreatAsFailure);
    assert_eq!(fetch(&context, &client, &options), None);
}

#[test]
fn client_that_cannot_start_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let diagnostic = fetch(&ctx(dir.path()), &BrokenClient, &options()).expect("diagnostic");
    assert_eq!(diagnostic.kind, DiagnosticKind::ClientUnavailable);
    assert!(diagnostic.message.contains("could not be started"));
}

/// Transcript lines, including ones that match the other failure rules.
fn transcript_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-c ]{0,20}",
        Just("Error message: Connection has been unexpectedly closed.".to_string()),
        Just("System Error.".to_string()),
        Just("Connection timed out".to_string()),
        Just("File or folder 'unit_rates.csv' does not exist.".to_string()),
        Just("Authentication failed.".to_string()),
    ]
}

#[test]
fn access_denied_followed_by_error_message_mentions_authentication() {
    let dir = tempfile::tempdir().unwrap();
    let client = FakeClient::new(&[
        "Access denied.",
        "Error message: Connection has been unexpectedly closed.",
    ]);
    let diagnostic = fetch(&ctx(dir.path()), &client, &options()).expect("diagnostic");
    assert_eq!(diagnostic.kind, DiagnosticKind::AccessDenied);
    assert!(diagnostic.message.contains("authentication"));
}

proptest! {
    #[test]
    fn access_denied_always_mentions_authentication(
        before in proptest::collection::vec(transcript_line(), 0..5),
        after in proptest::collection::vec(transcript_line(), 0..5),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut lines: Vec<String> = before;
        lines.push("Access denied.".to_string());
        lines.extend(after);
        let client = FakeClient {
            lines,
            exit_success: false,
            deliver: None,
            scripts: RefCell::new(Vec::new()),
        };
        let diagnostic = fetch(&ctx(dir.path()), &client, &options());
        let diagnostic = diagnostic.expect("diagnostic");
        prop_assert_eq!(diagnostic.kind, DiagnosticKind::AccessDenied);
        prop_assert!(diagnostic.message.contains("authentication"));
    }
}
