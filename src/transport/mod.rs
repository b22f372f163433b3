//! Concrete delivery backends for finished reports.
pub mod smtp;

pub use smtp::SmtpMailer;
