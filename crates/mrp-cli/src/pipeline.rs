//! Run orchestration.
//!
//! Drives one run through `Staging → Fetching → Validating → Loading → Done`.
//! A stage advances only when it reports no diagnostic; the first diagnostic
//! moves the run to `Failed`, is handed to the notifier once, and ends the run.

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{info, info_span, warn};

use mrp_fetch::{FetchOptions, TransferClient, fetch};
use mrp_ingest::prepare;
use mrp_load::{TableSink, load};
use mrp_model::{
    DEFAULT_EXPECTED_PROPERTY_COUNT, Diagnostic, PropertyLookup, RunContext, TableRef,
    ValidatedDataset,
};
use mrp_notify::{Notifier, NotifyReport};
use mrp_validate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Staging,
    Fetching,
    Validating,
    Loading,
    Done,
    Failed,
}

impl RunState {
    /// The state reached when this one succeeds. Terminal states map to
    /// themselves.
    pub fn next(self) -> Self {
        match self {
            Self::Staging => Self::Fetching,
            Self::Fetching => Self::Validating,
            Self::Validating => Self::Loading,
            Self::Loading => Self::Done,
            Self::Done => Self::Done,
            Self::Failed => Self::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Staging => "staging",
            Self::Fetching => "fetching",
            Self::Validating => "validating",
            Self::Loading => "loading",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed stage.
#[derive(Debug, Clone, Copy)]
pub struct StageRecord {
    pub state: RunState,
    pub elapsed: Duration,
    pub succeeded: bool,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Done {
        rows_loaded: usize,
    },
    Failed {
        failed_at: RunState,
        diagnostic: Diagnostic,
    },
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub stages: Vec<StageRecord>,
    /// Set only when the run failed and the notifier was called.
    pub notification: Option<NotifyReport>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Done { .. })
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match &self.outcome {
            RunOutcome::Done { .. } => None,
            RunOutcome::Failed { diagnostic, .. } => Some(diagnostic),
        }
    }
}

/// Context for validating a local report outside a scheduled run.
pub fn local_validation_context(
    file: &Path,
    run_date: NaiveDate,
    expected_count: Option<usize>,
) -> RunContext {
    let filename = file
        .file_name()
        .map_or_else(|| file.display().to_string(), |name| name.to_string_lossy().into_owned());
    let staging_dir = file.parent().unwrap_or_else(|| Path::new(""));
    RunContext::new(run_date, TableRef::new("local", "validate"))
        .with_target_filename(filename)
        .with_staging_dir(staging_dir)
        .with_expected_property_count(expected_count.unwrap_or(DEFAULT_EXPECTED_PROPERTY_COUNT))
}

/// Collaborators for one run.
pub struct PipelineParts<'a> {
    pub transfer: &'a dyn TransferClient,
    pub fetch_options: &'a FetchOptions,
    pub lookup: &'a PropertyLookup,
    pub sink: &'a mut dyn TableSink,
    pub notifier: &'a dyn Notifier,
}

/// Execute one run.
///
/// # Errors
///
/// Returns an error only when the staging area cannot be prepared. Stage
/// failures are reported through [`RunOutcome::Failed`].
pub fn run_pipeline(ctx: &RunContext, parts: PipelineParts<'_>) -> Result<RunReport> {
    let _guard = ctx.span.enter();
    let PipelineParts {
        transfer,
        fetch_options,
        lookup,
        sink,
        notifier,
    } = parts;

    let mut state = RunState::Staging;
    let mut stages = Vec::new();
    let mut dataset = ValidatedDataset::empty();
    let mut failure: Option<(RunState, Diagnostic)> = None;

    while !state.is_terminal() {
        let started = Instant::now();
        let diagnostic = match state {
            RunState::Staging => {
                let _span = info_span!("staging", dir = %ctx.staging_dir.display()).entered();
                prepare(&ctx.staging_dir).with_context(|| {
                    format!("prepare staging area {}", ctx.staging_dir.display())
                })?;
                info!(
                    duration_ms = started.elapsed().as_millis(),
                    "staging area ready"
                );
                None
            }
            RunState::Fetching => fetch(ctx, transfer, fetch_options),
            RunState::Validating => {
                let (validated, diagnostic) = validate(ctx, &ctx.staged_file(), lookup);
                dataset = validated;
                diagnostic
            }
            RunState::Loading => load(ctx, sink, &dataset),
            RunState::Done | RunState::Failed => break,
        };
        stages.push(StageRecord {
            state,
            elapsed: started.elapsed(),
            succeeded: diagnostic.is_none(),
        });
        match diagnostic {
            None => state = state.next(),
            Some(diagnostic) => {
                warn!(stage = %state, kind = ?diagnostic.kind, "run failed");
                failure = Some((state, diagnostic));
                state = RunState::Failed;
            }
        }
    }

    let report = match failure {
        Some((failed_at, diagnostic)) => {
            let notification = notifier.notify(ctx, &diagnostic);
            RunReport {
                outcome: RunOutcome::Failed {
                    failed_at,
                    diagnostic,
                },
                stages,
                notification: Some(notification),
            }
        }
        None => {
            info!(rows_loaded = dataset.len(), "run complete");
            RunReport {
                outcome: RunOutcome::Done {
                    rows_loaded: dataset.len(),
                },
                stages,
                notification: None,
            }
        }
    };
    Ok(report)
}
