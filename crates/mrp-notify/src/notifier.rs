use tracing::{error, info, info_span, warn};

use mrp_model::{Diagnostic, RunContext};

use crate::mailer::Mailer;

/// Delivery tally for one notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub sent: usize,
    pub failed: usize,
}

impl NotifyReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Receives the run's terminal diagnostic.
pub trait Notifier {
    fn notify(&self, ctx: &RunContext, diagnostic: &Diagnostic) -> NotifyReport;
}

/// Send `diagnostic` to each recipient individually over one session.
///
/// Never fails: session and delivery errors are logged and counted.
pub fn notify_recipients(
    ctx: &RunContext,
    diagnostic: &Diagnostic,
    recipients: &[String],
    mailer: &dyn Mailer,
) -> NotifyReport {
    let span = info_span!(parent: &ctx.span, "notify", recipients = recipients.len());
    let _guard = span.enter();
    let mut report = NotifyReport::default();

    if recipients.is_empty() {
        warn!("no error recipients configured, diagnostic was not mailed");
        return report;
    }

    let mut session = match mailer.open() {
        Ok(session) => session,
        Err(err) => {
            error!(error = %err, "could not open mail session");
            report.failed = recipients.len();
            return report;
        }
    };
    let subject = diagnostic.subject(ctx);
    for recipient in recipients {
        match session.send(recipient, &subject, &diagnostic.message) {
            Ok(()) => {
                info!(recipient = %recipient, "sent error notification");
                report.sent += 1;
            }
            Err(err) => {
                error!(recipient = %recipient, error = %err, "failed to send error notification");
                report.failed += 1;
            }
        }
    }
    session.close();
    report
}

/// Mails diagnostics to a fixed recipient list.
pub struct MailNotifier<M> {
    mailer: M,
    recipients: Vec<String>,
}

impl<M: Mailer> MailNotifier<M> {
    pub fn new(mailer: M, recipients: Vec<String>) -> Self {
        Self { mailer, recipients }
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }
}

impl<M: Mailer> Notifier for MailNotifier<M> {
    fn notify(&self, ctx: &RunContext, diagnostic: &Diagnostic) -> NotifyReport {
        notify_recipients(ctx, diagnostic, &self.recipients, &self.mailer)
    }
}
