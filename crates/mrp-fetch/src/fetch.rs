use std::time::Instant;

use serde::Deserialize;
use tracing::{debug, error, info, info_span, warn};

use mrp_model::{Diagnostic, DiagnosticKind, RunContext};

use crate::classify::{ClassificationRule, classify, default_rules};
use crate::client::{TransferClient, TransferScript};

/// What to do when the transcript matches no failure rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnrecognizedOutputPolicy {
    /// Treat the transfer as successful. This is the historical behaviour:
    /// unknown failure text passes silently.
    #[default]
    TreatAsSuccess,
    /// Fail when the client exited unsuccessfully or the file never arrived.
    TreatAsFailure,
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub session_url: String,
    pub host_key: String,
    pub rules: Vec<ClassificationRule>,
    pub unrecognized_output: UnrecognizedOutputPolicy,
}

impl FetchOptions {
    pub fn new(session_url: impl Into<String>, host_key: impl Into<String>) -> Self {
        Self {
            session_url: session_url.into(),
            host_key: host_key.into(),
            rules: default_rules(),
            unrecognized_output: UnrecognizedOutputPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_unrecognized_output(mut self, policy: UnrecognizedOutputPolicy) -> Self {
        self.unrecognized_output = policy;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: Vec<ClassificationRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn script(&self, ctx: &RunContext) -> TransferScript {
        TransferScript::download(
            &self.session_url,
            &self.host_key,
            &ctx.remote_dir,
            &ctx.target_filename,
            &ctx.staging_dir,
        )
    }
}

/// Download the day's report into the staging area.
///
/// Returns `None` when the transfer is considered successful.
pub fn fetch(
    ctx: &RunContext,
    client: &dyn TransferClient,
    options: &FetchOptions,
) -> Option<Diagnostic> {
    let span = info_span!(parent: &ctx.span, "fetch", file = %ctx.target_filename);
    let _guard = span.enter();
    let start = Instant::now();

    let output = match client.run(&options.script(ctx)) {
        Ok(output) => output,
        Err(err) => {
            error!(error = %err, "transfer client could not be run");
            return Some(Diagnostic::transfer(
                ctx,
                DiagnosticKind::ClientUnavailable,
                err.to_string(),
            ));
        }
    };
    for (index, line) in output.lines.iter().enumerate() {
        debug!(line_index = index, line = %line, "transfer output");
    }

    if let Some(outcome) = classify(&output.lines, &options.rules) {
        warn!(
            kind = ?outcome.kind,
            cause = %outcome.cause,
            "transfer failed"
        );
        return Some(Diagnostic::transfer(ctx, outcome.kind, outcome.cause));
    }

    let staged = ctx.staged_file();
    let arrived = staged.is_file();
    if !output.exit_success || !arrived {
        match options.unrecognized_output {
            UnrecognizedOutputPolicy::TreatAsSuccess => {
                warn!(
                    exit_success = output.exit_success,
                    file_present = arrived,
                    "transfer output matched no failure rule; treating as success"
                );
            }
            UnrecognizedOutputPolicy::TreatAsFailure => {
                let cause = output
                    .last_non_empty_line()
                    .unwrap_or("(no output)")
                    .to_string();
                warn!(
                    exit_success = output.exit_success,
                    file_present = arrived,
                    cause = %cause,
                    "transfer failed without a recognized error"
                );
                return Some(Diagnostic::transfer(
                    ctx,
                    DiagnosticKind::Unrecognized,
                    cause,
                ));
            }
        }
    }

    info!(
        path = %staged.display(),
        line_count = output.lines.len(),
        duration_ms = start.elapsed().as_millis(),
        "transfer complete"
    );
    None
}
