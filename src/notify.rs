//! SMTP notification
//!
//! Mails are built and delivered with `lettre`, the crate behind the
//! SMTP endpoint of proxmox-notify. The relay is contacted without TLS,
//! credentials are only sent if both user and password are configured.

use std::fmt::Display;
use std::time::Duration;

use anyhow::{format_err, Error};
use lettre::message::header::{ContentType, MIME_VERSION_1_0};
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};

use crate::config::SmtpConfig;
use crate::error::TapeAlertError;

const SMTP_TIMEOUT: Duration = Duration::from_secs(60);

/// A plain text notification mail
#[derive(Clone, Debug)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    /// Build the `text/plain` message
    pub fn to_message(&self) -> Result<Message, Error> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|err| format_err!("invalid sender address '{}' - {}", self.from, err))?;
        let to: Mailbox = self
            .to
            .parse()
            .map_err(|err| format_err!("invalid recipient address '{}' - {}", self.to, err))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(self.subject.as_str())
            .header(MIME_VERSION_1_0)
            .header(ContentType::TEXT_PLAIN)
            .body(self.body.clone())?;

        Ok(message)
    }
}

/// Plain SMTP transport to the configured relay
pub fn smtp_transport(config: &SmtpConfig) -> SmtpTransport {
    let mut builder = SmtpTransport::builder_dangerous(config.server.as_str())
        .port(config.port)
        .timeout(Some(SMTP_TIMEOUT));

    if let Some((user, password)) = config.credentials() {
        builder = builder.credentials(Credentials::new(user.to_string(), password.to_string()));
    }

    builder.build()
}

/// Build `email` and hand it to `transport`
pub fn deliver<T>(transport: &T, email: &Email) -> Result<(), Error>
where
    T: Transport,
    T::Error: Display,
{
    let message = email.to_message()?;
    transport
        .send(&message)
        .map_err(|err| format_err!("{}", err))?;
    Ok(())
}

/// Send `email` through the relay given by `config`
pub fn send_email(config: &SmtpConfig, email: &Email) -> Result<(), TapeAlertError> {
    deliver(&smtp_transport(config), email).map_err(|err| {
        TapeAlertError::Notification(format!(
            "error while sending mail via SMTP server {}:{} - {}",
            config.server, config.port, err
        ))
    })
}
