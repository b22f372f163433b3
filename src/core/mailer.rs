//! Report delivery abstractions

use crate::core::error::{PipelineError, Result};
use crate::core::helpers::validate_email;
use std::path::PathBuf;
use tracing::{error, info};

pub const DEFAULT_BODY: &str = "Please find attached the latest financial analysis report.";

/// A report ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct ReportEmail {
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub report_path: PathBuf,
}

impl ReportEmail {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        report_path: impl Into<PathBuf>,
    ) -> Self {
        ReportEmail {
            sender: sender.into(),
            recipient: recipient.into(),
            subject: subject.into(),
            body: DEFAULT_BODY.to_string(),
            report_path: report_path.into(),
        }
    }

    /// Checks both addresses before any transport is attempted.
    pub fn validate(&self) -> Result<()> {
        for address in [&self.sender, &self.recipient] {
            if !validate_email(address) {
                return Err(PipelineError::InvalidEmail(address.clone()));
            }
        }
        Ok(())
    }

    /// File name used for the attachment.
    pub fn attachment_name(&self) -> String {
        self.report_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.md".to_string())
    }
}

pub trait ReportMailer {
    fn send_report(&self, email: &ReportEmail) -> Result<()>;
}

/// Sends `email` and reports the outcome as a boolean. Failures are logged, not returned.
pub fn send_report_or_log(mailer: &dyn ReportMailer, email: &ReportEmail) -> bool {
    match email.validate().and_then(|_| mailer.send_report(email)) {
        Ok(()) => {
            info!("Sent report {} to {}", email.report_path.display(), email.recipient);
            true
        }
        Err(e) => {
            error!(error = %e, "Error sending email");
            false
        }
    }
}
