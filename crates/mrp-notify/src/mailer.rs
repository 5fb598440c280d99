use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::debug;

use crate::error::NotifyError;

pub const DEFAULT_RELAY: &str = "smtp.office365.com";
pub const DEFAULT_RELAY_PORT: u16 = 587;

/// An open, authenticated session with the mail relay.
pub trait MailSession {
    /// Send `body` to a single recipient.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the message cannot be built or delivered.
    fn send(&mut self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;

    /// End the session.
    fn close(self: Box<Self>);
}

/// Opens sessions with a mail relay.
pub trait Mailer {
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the relay cannot be reached or rejects the
    /// credentials.
    fn open(&self) -> Result<Box<dyn MailSession + '_>, NotifyError>;
}

/// STARTTLS relay with login credentials.
pub struct SmtpMailer {
    relay: String,
    port: u16,
    sender: String,
    password: String,
}

impl SmtpMailer {
    pub fn new(sender: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            relay: DEFAULT_RELAY.to_string(),
            port: DEFAULT_RELAY_PORT,
            sender: sender.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn with_relay(mut self, relay: impl Into<String>, port: u16) -> Self {
        self.relay = relay.into();
        self.port = port;
        self
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("relay", &self.relay)
            .field("port", &self.port)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|source| NotifyError::Address {
        address: address.to_string(),
        source,
    })
}

impl Mailer for SmtpMailer {
    fn open(&self) -> Result<Box<dyn MailSession + '_>, NotifyError> {
        let from = parse_mailbox(&self.sender)?;
        let transport = SmtpTransport::starttls_relay(&self.relay)?
            .port(self.port)
            .credentials(Credentials::new(
                self.sender.clone(),
                self.password.clone(),
            ))
            .build();
        if !transport.test_connection()? {
            return Err(NotifyError::Other(format!(
                "mail relay {}:{} did not accept the connection",
                self.relay, self.port
            )));
        }
        debug!(relay = %self.relay, port = self.port, "mail session opened");
        Ok(Box::new(SmtpSession { transport, from }))
    }
}

struct SmtpSession {
    transport: SmtpTransport,
    from: Mailbox,
}

impl MailSession for SmtpSession {
    fn send(&mut self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(recipient)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;
        self.transport.send(&message)?;
        Ok(())
    }

    fn close(self: Box<Self>) {
        debug!("mail session closed");
    }
}
