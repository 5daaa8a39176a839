//! Mail notification about a finished backup.

use std::path::Path;

use chrono::{DateTime, Local};
use derive_more::{Display, Error, From};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::cli::SmtpArgs;

/// Errors on sending the notification.
#[derive(Debug, Display, Error, From)]
pub enum NotificationError {
    #[display("invalid mail address: {_0}")]
    #[from]
    Address(lettre::address::AddressError),
    #[display("composing the mail failed: {_0}")]
    #[from]
    Message(lettre::error::Error),
    #[display("sending the mail failed: {_0}")]
    #[from]
    Smtp(lettre::transport::smtp::Error),
}

/// Summary of a finished backup.
#[derive(Debug, Clone)]
pub struct Report {
    pub database: String,
    pub file_name: String,
    pub link: String,
    pub timestamp: DateTime<Local>,
}

impl Report {
    pub fn new(database: &str, backup_file: &Path, link: &str) -> Self {
        Self {
            database: database.to_string(),
            file_name: backup_file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            link: link.to_string(),
            timestamp: Local::now(),
        }
    }

    pub fn subject(&self) -> String {
        format!(
            "MySQL Backup - {} - {}",
            self.database,
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        )
    }

    pub fn body(&self) -> String {
        let Self {
            database,
            file_name,
            link,
            timestamp,
        } = self;
        let timestamp = timestamp.format("%Y-%m-%d %H:%M:%S");

        format!(
            "MySQL Database Backup Completed\n\
             \n\
             Database: {database}\n\
             Backup File: {file_name}\n\
             Timestamp: {timestamp}\n\
             \n\
             Download Link:\n\
             {link}\n\
             \n\
             This is an automated backup notification.\n"
        )
    }
}

/// Sends plain text mails through an authenticated STARTTLS session.
pub struct Mailer {
    transport: SmtpTransport,
    from: Mailbox,
    to: Mailbox,
}

impl Mailer {
    /// Checks the addresses and prepares the transport, no connection is made.
    pub fn with_config(config: &SmtpArgs) -> Result<Self, NotificationError> {
        let from: Mailbox = config.from.parse()?;
        let to: Mailbox = config.to.parse()?;

        let transport = SmtpTransport::starttls_relay(&config.server)?
            .port(config.port)
            .credentials(Credentials::new(
                config.from.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }

    pub fn send(&self, report: &Report) -> Result<(), NotificationError> {
        log::info!(target: "notify", "Send backup notification to {}", self.to);

        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(report.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(report.body())?;
        self.transport.send(&message)?;

        log::debug!(target: "notify", "Notification sent");
        Ok(())
    }
}
