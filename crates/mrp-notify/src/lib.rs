//! Error notifier.
//!
//! Fans a diagnostic out to every recipient over one mail session. Delivery
//! is best-effort: failures are logged and counted, never propagated.

pub mod error;
pub mod mailer;
pub mod notifier;
pub mod recipients;

pub use error::NotifyError;
pub use mailer::{DEFAULT_RELAY, DEFAULT_RELAY_PORT, MailSession, Mailer, SmtpMailer};
pub use notifier::{MailNotifier, NotifyReport, Notifier, notify_recipients};
pub use recipients::parse_recipient_list;
