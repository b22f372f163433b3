use crate::core::error::{PipelineError, Result};
use crate::core::mailer::{ReportEmail, ReportMailer};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fs;
use tracing::debug;

/// Sends reports through an SMTP relay using STARTTLS.
///
/// The sender address doubles as the login name.
pub struct SmtpMailer {
    server: String,
    port: u16,
    password: String,
}

impl SmtpMailer {
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        SmtpMailer {
            server: server.into(),
            port,
            password: String::new(),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }
}

fn mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|_| PipelineError::InvalidEmail(address.to_string()))
}

/// Builds the multipart message with the report attached as plain text.
pub(crate) fn build_message(email: &ReportEmail) -> Result<Message> {
    let content = fs::read(&email.report_path).map_err(|e| PipelineError::io(&email.report_path, e))?;

    Message::builder()
        .from(mailbox(&email.sender)?)
        .to(mailbox(&email.recipient)?)
        .subject(email.subject.as_str())
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(email.body.clone()))
                .singlepart(Attachment::new(email.attachment_name()).body(content, ContentType::TEXT_PLAIN)),
        )
        .map_err(|e| PipelineError::Transport(e.to_string()))
}

impl ReportMailer for SmtpMailer {
    fn send_report(&self, email: &ReportEmail) -> Result<()> {
        let message = build_message(email)?;

        debug!("Connecting to {}:{}", self.server, self.port);
        let transport = SmtpTransport::starttls_relay(&self.server)
            .map_err(|e| PipelineError::Transport(e.to_string()))?
            .port(self.port)
            .credentials(Credentials::new(email.sender.clone(), self.password.clone()))
            .build();

        transport
            .send(&message)
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        Ok(())
    }
}
