//! Outbound Mail Abstraction
//!
//! The application layers only produce a message payload; delivery is the
//! implementor's concern (SMTP, HTTP API, etc.). A failed send is surfaced
//! to the caller immediately; there is no queue and no retry here.

use thiserror::Error;

/// A single outbound email
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Mail delivery error
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

/// Mail delivery abstraction
#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    /// Deliver a message or return an error
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Local dev mailer that logs the payload instead of sending real email
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body_bytes = message.html_body.len(),
            "mail send stub"
        );
        Ok(())
    }
}
