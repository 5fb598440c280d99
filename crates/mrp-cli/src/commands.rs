use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{info, info_span};

use mrp_cli::config::RunConfig;
use mrp_cli::pipeline::{PipelineParts, RunReport, local_validation_context, run_pipeline};
use mrp_fetch::ScriptedTransferClient;
use mrp_ingest::load_property_lookup;
use mrp_load::PostgresSink;
use mrp_model::{Diagnostic, RunContext, ValidatedDataset};
use mrp_notify::{MailNotifier, SmtpMailer};
use mrp_validate::validate;

use crate::cli::{RunArgs, ValidateArgs};

pub fn run_job(args: &RunArgs, run_date: NaiveDate) -> Result<(RunContext, RunReport)> {
    let settings = RunConfig::load(args.config.as_deref())
        .context("load configuration")?
        .apply_env(|key| std::env::var(key).ok())
        .resolve()
        .context("resolve configuration")?;

    let span = info_span!(
        "run",
        run_date = %run_date,
        table = %settings.sink.destination,
    );
    let ctx = settings.run_context(run_date).with_span(span);
    let lookup = {
        let _guard = ctx.span.enter();
        let lookup = load_property_lookup(&settings.lookup_path).with_context(|| {
            format!(
                "load property lookup {}",
                settings.lookup_path.display()
            )
        })?;
        info!(properties = lookup.len(), "property lookup loaded");
        lookup
    };

    let transfer = ScriptedTransferClient::new(&settings.transfer.program);
    let fetch_options = settings.fetch_options();
    let mut sink = PostgresSink::new(&settings.sink.connection_string)
        .with_batch_size(settings.sink.batch_size);
    let notifier = MailNotifier::new(
        SmtpMailer::new(&settings.mail.sender, &settings.mail.password)
            .with_relay(&settings.mail.relay, settings.mail.port),
        settings.mail.recipients.clone(),
    );

    let report = run_pipeline(
        &ctx,
        PipelineParts {
            transfer: &transfer,
            fetch_options: &fetch_options,
            lookup: &lookup,
            sink: &mut sink,
            notifier: &notifier,
        },
    )?;
    Ok((ctx, report))
}

pub fn run_validate(
    args: &ValidateArgs,
    run_date: NaiveDate,
) -> Result<(RunContext, ValidatedDataset, Option<Diagnostic>)> {
    let span = info_span!("validate_file", run_date = %run_date, file = %args.file.display());
    let ctx = local_validation_context(&args.file, run_date, args.expected_count).with_span(span);
    let lookup = load_property_lookup(&args.lookup)
        .with_context(|| format!("load property lookup {}", args.lookup.display()))?;
    let (dataset, diagnostic) = validate(&ctx, &args.file, &lookup);
    Ok((ctx, dataset, diagnostic))
}
