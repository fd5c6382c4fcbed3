// src/mailer.rs

use crate::config::MailConfig;
use crate::errors::NotifyError;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::path::Path;
use tracing::info;

pub const ATTACHMENT_NAME: &str = "zillow_report.xlsx";
const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub struct MailCredentials {
    pub user: String,
    pub secret: String,
}

/// Delivers a finished message. One call is one submission.
pub trait MailTransport {
    fn submit(&self, credentials: &MailCredentials, message: &Message) -> Result<(), NotifyError>;
}

/// Authenticated SMTP over TLS. A fresh connection is opened for every
/// submission and dropped when `submit` returns, whether or not the send
/// succeeded.
pub struct SmtpSubmission {
    host: String,
    port: u16,
}

impl SmtpSubmission {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl MailTransport for SmtpSubmission {
    fn submit(&self, credentials: &MailCredentials, message: &Message) -> Result<(), NotifyError> {
        // 587 speaks STARTTLS, everything else implicit TLS (465).
        let relay = if self.port == 587 {
            SmtpTransport::starttls_relay(&self.host)
        } else {
            SmtpTransport::relay(&self.host)
        };
        let builder = relay.map_err(|e| NotifyError::Send(e.to_string()))?;

        let transport = builder
            .port(self.port)
            .credentials(Credentials::new(
                credentials.user.clone(),
                credentials.secret.clone(),
            ))
            .build();

        transport
            .send(message)
            .map(|_| ())
            .map_err(|e| NotifyError::Send(e.to_string()))
    }
}

pub struct ReportEmail<'a> {
    pub subject: String,
    pub body: String,
    pub attachment: Option<&'a Path>,
}

pub struct Notifier<T = SmtpSubmission> {
    config: MailConfig,
    transport: T,
}

impl Notifier<SmtpSubmission> {
    pub fn from_config(config: &MailConfig) -> Self {
        let transport = SmtpSubmission::new(config.smtp_host.clone(), config.smtp_port);
        Self::with_transport(config.clone(), transport)
    }
}

impl<T: MailTransport> Notifier<T> {
    pub fn with_transport(config: MailConfig, transport: T) -> Self {
        Self { config, transport }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `email`, failing closed: with a credential or the recipient
    /// missing the transport is never touched. Send failures are returned
    /// as-is; there is no retry.
    pub fn send(&self, email: &ReportEmail<'_>) -> Result<(), NotifyError> {
        let user = self
            .config
            .sender
            .as_deref()
            .ok_or(NotifyError::MissingCredential("GMAIL_USER"))?;
        let secret = self
            .config
            .secret
            .as_deref()
            .ok_or(NotifyError::MissingCredential("GMAIL_PASS"))?;
        let recipient = self
            .config
            .effective_recipient()
            .ok_or(NotifyError::MissingRecipient)?;

        let message = build_message(user, recipient, email)?;
        let credentials = MailCredentials {
            user: user.to_string(),
            secret: secret.to_string(),
        };

        self.transport.submit(&credentials, &message)?;
        info!(recipient, subject = email.subject.as_str(), "📧 Report emailed");
        Ok(())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse::<Mailbox>().map_err(|e| NotifyError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Plain-text body, plus the spreadsheet under a fixed file name when given.
pub fn build_message(from: &str, to: &str, email: &ReportEmail<'_>) -> Result<Message, NotifyError> {
    let builder = Message::builder()
        .from(mailbox(from)?)
        .to(mailbox(to)?)
        .subject(email.subject.clone());

    let message = match email.attachment {
        Some(path) => {
            let bytes = std::fs::read(path).map_err(|source| NotifyError::Attachment {
                path: path.to_path_buf(),
                source,
            })?;
            let content_type =
                ContentType::parse(XLSX_CONTENT_TYPE).map_err(|e| NotifyError::Build(e.to_string()))?;

            builder.multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(email.body.clone()))
                    .singlepart(Attachment::new(ATTACHMENT_NAME.to_string()).body(bytes, content_type)),
            )
        }
        None => builder.body(email.body.clone()),
    };

    message.map_err(|e| NotifyError::Build(e.to_string()))
}
